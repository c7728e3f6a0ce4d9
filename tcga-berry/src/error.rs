//! 运行时错误与诊断信息.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 流水线配置或使用方式错误.
///
/// 这两类错误都会被立即拒绝, 不产生任何部分状态.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// mpp (物理像素间距) 未设置或非正.
    SpacingNotPositive(f64),

    /// 掩码尚未设置, 流水线无法运行.
    NotConfigured,

    /// 流水线尚未运行完成, 查询被拒绝.
    NotComputed,
}

/// 流水线运行时错误的统一返回类型.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// 单个对象级别的非致命事件.
///
/// 这类事件不会让整个流水线失败: 出问题的对象保持原样,
/// 事件被记录下来, 运行结束后可通过
/// [`crate::NucleusAnalysis::diagnostics`] 查询.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Diagnostic {
    /// 不规则度计算遇到零面积对象. 该对象永远不会被拆分.
    DegenerateObject {
        /// 对象在 (拆分前) 标签图中的标签.
        label: u32,
    },

    /// 聚类 collaborator 对非空点集返回了空的或长度不符的划分.
    /// 该对象保持原标签不变.
    CollaboratorFailure {
        /// 对象在 (拆分前) 标签图中的标签.
        label: u32,

        /// 该对象的像素个数.
        points: usize,
    },
}
