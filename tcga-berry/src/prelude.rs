//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx2d;

pub use crate::data::{CompactLabelGrid, LabelGrid, NucleusMask};

pub use crate::conn::{
    area_threshold_relabel, label_components, relabel, Connectivity, UnionFind,
};

pub use crate::features::{compute_features, ObjectRecord, ObjectTable};

pub use crate::split::{MeanShiftClusterer, PointClusterer};

pub use crate::analysis::{AnalysisParams, FeatureKind, NucleusAnalysis};

pub use crate::error::{AnalysisError, AnalysisResult, Diagnostic};

pub use crate::consts::gray::{MASK_BACKGROUND, MASK_NUCLEUS};
pub use crate::consts::LABEL_BACKGROUND;
