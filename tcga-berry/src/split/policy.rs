//! 拆分判定.

use crate::{Diagnostic, ObjectTable};

/// 逐对象判定是否需要拆分. 返回与特征表等长的标记数组,
/// 第 `label - 1` 项为 `true` 表示标签为 `label` 的对象需要拆分.
///
/// 判定准则 (按顺序短路):
///
/// 1. 面积大于 `upper_area` (µm²) 的对象一定拆分, 与形状无关;
/// 2. 不规则度 `周长² / 面积` 大于 `irregularity_threshold` 的对象拆分.
///
/// 零面积对象无法计算不规则度, 永远不拆分,
/// 并向 `diagnostics` 记录一条 [`Diagnostic::DegenerateObject`].
pub fn flag_oversized(
    table: &ObjectTable,
    upper_area: f64,
    irregularity_threshold: f64,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<bool> {
    table
        .iter()
        .enumerate()
        .map(|(id, rec)| {
            if rec.area > upper_area {
                return true;
            }
            match rec.irregularity() {
                Some(measure) => measure > irregularity_threshold,
                None => {
                    diagnostics.push(Diagnostic::DegenerateObject {
                        label: id as u32 + 1,
                    });
                    false
                }
            }
        })
        .collect()
}
