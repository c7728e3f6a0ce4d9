//! 掩码与标签图基础数据结构.

mod grid;
mod iter;
mod mask;

pub use grid::{CompactLabelGrid, LabelGrid};
pub use mask::NucleusMask;

pub(crate) use iter::PosIter;
