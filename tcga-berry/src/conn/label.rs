//! union-find 前向扫描的连通分量标记.

use super::{causal_neighbours, Connectivity, UnionFind};
use crate::consts::gray::is_background;
use crate::data::PosIter;
use crate::{LabelGrid, NucleusMask};

/// 对二值掩码做连通分量标记, 返回 (不保证连续的) 正标签图.
///
/// 算法为单趟行优先前向扫描: 对每个前景像素检查其因果邻居
/// (西 / 北, 8-邻接时加西北 / 东北).
/// 若邻居都不是前景, 分配一个新的临时标签;
/// 否则取邻居临时标签中的最小者, 并把所有邻居标签在并查集中合并.
/// 第二趟扫描把每个临时标签压平到其并查集根, 得到最终标签图.
///
/// 扫描顺序和 "取最小邻居标签" 的平局规则固定,
/// 因此对同一掩码和邻接规则, 输出完全确定.
/// 背景像素永远不会被标记. 摊还复杂度接近像素个数的线性.
///
/// 输出标签不连续, 需要用 [`super::relabel`] 或
/// [`super::area_threshold_relabel`] 紧致化.
pub fn label_components(mask: &NucleusMask, conn: Connectivity) -> LabelGrid {
    let shape = mask.shape();
    let mut grid = LabelGrid::zeros(shape);
    if mask.size() == 0 {
        return grid;
    }

    // 临时标签以 `id + 1` 的形式存进标签图, 0 仍然表示背景.
    // 临时标签个数不会超过像素个数, 因此 arena 直接按图像大小分配.
    let mut uf = UnionFind::new(mask.size());
    let mut next_id: u32 = 0;

    for pos in mask.pos_iter() {
        if is_background(mask[pos]) {
            continue;
        }

        let mut assigned: Option<u32> = None;
        for neigh in causal_neighbours(pos, conn) {
            if !grid.check(neigh) || is_background(mask[neigh]) {
                continue;
            }
            let stored = grid[neigh];
            debug_assert_ne!(stored, 0);
            match assigned {
                None => assigned = Some(stored),
                Some(prev) => {
                    uf.union(prev - 1, stored - 1);
                    if stored < prev {
                        assigned = Some(stored);
                    }
                }
            }
        }

        grid[pos] = match assigned {
            Some(stored) => stored,
            None => {
                next_id += 1;
                next_id
            }
        };
    }

    // 第二趟: 压平到并查集根.
    for pos in PosIter::new(shape) {
        let stored = grid[pos];
        if stored != 0 {
            grid[pos] = uf.find(stored - 1) + 1;
        }
    }

    grid
}
