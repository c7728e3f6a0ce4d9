//! 被标记对象的聚类拆分与全局唯一重标号.

use super::PointClusterer;
use crate::conn::relabel;
use crate::{Diagnostic, Idx2d, Idx2dF, LabelGrid};
use num::ToPrimitive;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// 像素索引转为聚类用的浮点坐标.
#[inline]
fn to_point((h, w): Idx2d) -> Idx2dF {
    // usize -> f64 不会失败.
    (h.to_f64().unwrap(), w.to_f64().unwrap())
}

/// 对所有被标记的对象做聚类拆分, 然后把整张图紧致化为 `1..=n'`.
/// 返回最终对象个数 `n'`.
///
/// `flags` 与当前对象个数等长, 第 `label - 1` 项为 `true`
/// 表示标签为 `label` 的对象需要拆分 (见 [`super::flag_oversized`]).
///
/// 拆分流程维护一个 `current_max` 计数器, 初值为图中最大标签.
/// 被标记对象按原标签升序处理: 以行优先顺序收集该对象的像素坐标,
/// 连同 `bandwidth` (像素单位) 一起交给聚类 collaborator;
/// 每个像素写回新标签 `current_max + 簇编号 + 1`,
/// 对象处理完后 `current_max` 前进 `最大簇编号 + 1`.
/// 于是每个新标签都严格大于之前用过的任何标签,
/// 不同对象的子标签不可能冲突.
///
/// collaborator 返回空划分或长度不符时, 该对象保持原标签不变,
/// 记录一条 [`Diagnostic::CollaboratorFailure`] 并继续,
/// 不会让整个流水线失败.
///
/// 开启 `rayon` feature 时, 各对象的聚类并行执行
/// (不同对象的像素集互不相交); 标签区间的分配和写回仍按
/// 升序串行进行, 因此输出与串行路径完全一致.
pub fn break_regions<C: PointClusterer + Sync>(
    grid: &mut LabelGrid,
    flags: &[bool],
    clusterer: &C,
    bandwidth: f64,
    diagnostics: &mut Vec<Diagnostic>,
) -> u32 {
    let mut current_max = grid.max_label();

    // 一趟扫描收集所有被标记对象的像素, 行优先顺序.
    let mut members: Vec<Vec<Idx2d>> = vec![Vec::new(); flags.len()];
    for (pos, &label) in grid.indexed_iter() {
        if label == 0 {
            continue;
        }
        let id = (label - 1) as usize;
        if *flags.get(id).unwrap_or(&false) {
            members[id].push(pos);
        }
    }

    let targets: Vec<(u32, Vec<Idx2d>)> = members
        .into_iter()
        .enumerate()
        .filter(|(_, pixels)| !pixels.is_empty())
        .map(|(id, pixels)| (id as u32 + 1, pixels))
        .collect();

    // 聚类本身可以并行; 写回按标签升序串行, 保证输出确定.
    let run_one = |(_, pixels): &(u32, Vec<Idx2d>)| {
        let points: Vec<Idx2dF> = pixels.iter().copied().map(to_point).collect();
        clusterer.cluster(&points, bandwidth)
    };

    #[cfg(feature = "rayon")]
    let partitions: Vec<Vec<usize>> = targets.par_iter().map(run_one).collect();
    #[cfg(not(feature = "rayon"))]
    let partitions: Vec<Vec<usize>> = targets.iter().map(run_one).collect();

    for ((label, pixels), cluster_ids) in targets.iter().zip(partitions) {
        if cluster_ids.len() != pixels.len() {
            log::warn!(
                "聚类 collaborator 对标签 {} ({} 像素) 返回了 {} 项划分, 跳过该对象",
                label,
                pixels.len(),
                cluster_ids.len()
            );
            diagnostics.push(Diagnostic::CollaboratorFailure {
                label: *label,
                points: pixels.len(),
            });
            continue;
        }

        let mut max_cluster_id = 0usize;
        for (&pos, &cid) in pixels.iter().zip(cluster_ids.iter()) {
            max_cluster_id = max_cluster_id.max(cid);
            grid[pos] = current_max + cid as u32 + 1;
        }
        current_max += max_cluster_id as u32 + 1;
    }

    // 最终紧致化, 不做任何面积过滤.
    relabel(grid)
}
