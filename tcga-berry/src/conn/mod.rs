//! 连通分量标记: union-find 前向扫描算法与标签紧致化.

mod label;
mod relabel;
mod union_find;

pub use label::label_components;
pub use relabel::{area_threshold_relabel, relabel};
pub use union_find::UnionFind;

use crate::Idx2d;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 连通分量的邻接规则.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Connectivity {
    /// 4-邻接: 上下左右.
    Four,

    /// 8-邻接: 上下左右加四个对角.
    ///
    /// 病理图像中粘连核之间往往只有对角接触, 故默认使用 8-邻接.
    #[default]
    Eight,
}

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 获得 `(h, w)` 的 8-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour8((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.wrapping_sub(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.saturating_add(1)),
    ]
}

/// 获得 `(h, w)` 的因果邻居索引, 即行优先扫描时已被访问过的邻居.
///
/// 4-邻接时为西, 北; 8-邻接时额外加上西北和东北.
/// 返回的索引可能越界 (利用 `usize` 回绕表示), 由调用方过滤.
#[inline]
pub(crate) fn causal_neighbours((h, w): Idx2d, conn: Connectivity) -> [Idx2d; 4] {
    match conn {
        // 哨兵索引一定会被调用方的越界检查滤掉.
        Connectivity::Four => [
            (h, w.wrapping_sub(1)),
            (h.wrapping_sub(1), w),
            (usize::MAX, usize::MAX),
            (usize::MAX, usize::MAX),
        ],
        Connectivity::Eight => [
            (h, w.wrapping_sub(1)),
            (h.wrapping_sub(1), w.wrapping_sub(1)),
            (h.wrapping_sub(1), w),
            (h.wrapping_sub(1), w.saturating_add(1)),
        ],
    }
}
