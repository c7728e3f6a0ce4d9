//! 逐对象形状特征提取.

use crate::conn::neighbour4;
use crate::{AnalysisError, AnalysisResult, LabelGrid};
use itertools::izip;
use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单个对象的形状统计量.
///
/// 物理量都由 mpp (每像素微米数) 换算得到, 满足
/// `area / mpp² == pixel_count`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectRecord {
    /// 对象的像素个数.
    pub pixel_count: usize,

    /// 面积 (单位: µm²). 等于 `pixel_count * mpp²`.
    pub area: f64,

    /// 周长 (单位: µm). 等于边界棱数 * mpp.
    ///
    /// 一个前景像素的 4 条棱中, 朝向图像外 / 背景 / 不同标签的
    /// 每条棱都计入边界.
    pub perimeter: f64,

    /// 等效半径 (单位: µm). 即与该对象面积相同的圆的半径.
    pub equivalent_radius: f64,
}

impl ObjectRecord {
    /// 不规则度 `周长² / 面积` (无量纲).
    ///
    /// 细长或多瓣 (很可能是粘连) 的对象该值偏高.
    /// 零面积对象返回 `None`, 避免除零.
    #[inline]
    pub fn irregularity(&self) -> Option<f64> {
        (self.area > 0.0).then(|| self.perimeter * self.perimeter / self.area)
    }
}

/// 对象特征表. 第 `label - 1` 项描述标签为 `label` 的对象.
pub type ObjectTable = Vec<ObjectRecord>;

/// 对紧致化后的标签图逐对象计算形状特征.
///
/// `n` 为对象个数, 标签图中的正标签必须恰为 `1..=n`
/// (即已经过 [`crate::conn::relabel`]); 违反时程序 panic.
/// `mpp` 非正时返回 [`AnalysisError::SpacingNotPositive`].
///
/// 返回的特征表长度恰为 `n`.
pub fn compute_features(grid: &LabelGrid, n: u32, mpp: f64) -> AnalysisResult<ObjectTable> {
    if mpp <= 0.0 {
        return Err(AnalysisError::SpacingNotPositive(mpp));
    }

    let n = n as usize;
    let mut pixels = vec![0usize; n];
    let mut edges = vec![0usize; n];

    for (pos, &label) in grid.indexed_iter() {
        if label == 0 {
            continue;
        }
        assert!(label as usize <= n, "标签图未紧致化");
        let id = (label - 1) as usize;
        pixels[id] += 1;
        for neigh in neighbour4(pos) {
            match grid.get(neigh) {
                Some(&nl) if nl == label => {}
                // 越界 / 背景 / 不同标签: 这条棱在对象边界上.
                _ => edges[id] += 1,
            }
        }
    }

    let table = izip!(pixels, edges)
        .map(|(pixel_count, boundary_edges)| {
            let area = pixel_count as f64 * mpp * mpp;
            ObjectRecord {
                pixel_count,
                area,
                perimeter: boundary_edges as f64 * mpp,
                equivalent_radius: (area / PI).sqrt(),
            }
        })
        .collect();
    Ok(table)
}
