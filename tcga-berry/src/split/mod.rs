//! 粘连对象的拆分: 判定准则与点集聚类拆分.

mod cluster;
mod policy;
mod splitter;

pub use cluster::{MeanShiftClusterer, PointClusterer};
pub use policy::flag_oversized;
pub use splitter::break_regions;
