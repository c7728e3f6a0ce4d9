//! 标签紧致化与面积窗口过滤.

use crate::data::PosIter;
use crate::LabelGrid;
use std::collections::HashMap;

/// 把任意正标签紧致化为 `1..=n`, 返回 `n` (对象个数).
///
/// 新标签按行优先扫描中旧标签的 **首次出现顺序** 编号,
/// 因此对同一输入, 输出完全确定. 背景 (0) 保持不变.
/// 对已经连续的标签图再做一次紧致化, 结果与输入相同.
pub fn relabel(grid: &mut LabelGrid) -> u32 {
    let mut mapping: HashMap<u32, u32> = HashMap::new();
    let mut next: u32 = 0;
    for pos in PosIter::new(grid.shape()) {
        let old = grid[pos];
        if old == 0 {
            continue;
        }
        let new = *mapping.entry(old).or_insert_with(|| {
            next += 1;
            next
        });
        grid[pos] = new;
    }
    next
}

/// 先按像素个数过滤, 再紧致化. 返回保留下来的对象个数.
///
/// 像素个数落在 `[lower_px, upper_px]` 之外的标签整体改写为背景,
/// 剩余标签按 [`relabel`] 的规则紧致化为 `1..=n`.
///
/// 本流水线在特征提取前只使用下限 (`upper_px` 传 `usize::MAX`):
/// 过大的对象要交给拆分阶段处理, 而不是直接丢弃.
pub fn area_threshold_relabel(grid: &mut LabelGrid, lower_px: usize, upper_px: usize) -> u32 {
    let mut pixel_count: HashMap<u32, usize> = HashMap::new();
    for (_, &label) in grid.indexed_iter() {
        if label != 0 {
            *pixel_count.entry(label).or_insert(0) += 1;
        }
    }

    for pos in PosIter::new(grid.shape()) {
        let label = grid[pos];
        if label == 0 {
            continue;
        }
        let count = pixel_count[&label];
        if count < lower_px || count > upper_px {
            grid[pos] = 0;
        }
    }

    relabel(grid)
}
