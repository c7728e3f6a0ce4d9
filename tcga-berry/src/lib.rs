#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 对病理切片 (H&E, TCGA 数据集风格) 细胞核分割产出的二值掩码
//! 进行后处理: 连通分量标记, 形状特征提取, 以及粘连细胞核的拆分.
//!
//! 分割算法本身 (阈值化 / 水平集 / 种子生长等) 不在本 crate 范围内;
//! 本 crate 只从一张二值掩码出发, 产出一张分离良好的标签图和每个对象的
//! 形状统计量.
//!
//! 该 crate 目前仅提供 `safe` 接口. 在非期望情况下, 程序会直接 panic,
//! 而不会导致内存错误. As what Rust promises.
//!
//! # 流水线
//!
//! 1. 连通分量标记 (从零实现的 union-find 前向扫描算法);
//! 2. 标签紧致化, 同时去除小于面积下限的噪声碎片;
//! 3. 逐对象计算面积 / 周长 / 等效半径 (物理单位, 由 mpp 换算);
//! 4. 拆分判定: 面积过大, 或 `周长² / 面积` 过高的对象被标记;
//! 5. 对被标记对象做点集聚类拆分, 新标签全局唯一;
//! 6. 最终紧致化, 并重新计算特征表.
//!
//! # 开发计划
//!
//! ### 前向扫描连通分量标记 ✅
//!
//! 因果邻居 (西/北, 8-邻接时加西北/东北) + union-find 的单趟扫描,
//! 第二趟压平到根标签. 实现位于 `tcga-berry/src/conn`.
//!
//! ### 标签紧致化与面积窗口过滤 ✅
//!
//! 任意正标签 -> `1..=n`, 按行优先首次出现顺序编号.
//! 实现位于 `tcga-berry/src/conn/relabel.rs`.
//!
//! ### 形状特征提取 ✅
//!
//! 面积 = 像素数 * mpp², 周长 = 边界棱数 * mpp, 等效半径 = `sqrt(面积/π)`.
//! 实现位于 `tcga-berry/src/features.rs`.
//!
//! ### 拆分判定与聚类拆分 ✅
//!
//! 判定准则和默认门限来自对 TCGA COAD 数据的经验调参.
//! 聚类器是可替换的 collaborator, 本 crate 自带一个确定性的
//! 平坦核 mean-shift 实现. 实现位于 `tcga-berry/src/split`.
//!
//! ### 状态机驱动的流水线封装 ✅
//!
//! `Unconfigured -> Configured -> Computed`, 非法操作返回类型化错误
//! 而不是中止进程. 实现位于 `tcga-berry/src/analysis.rs`.
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private API 提供文档.

/// 二维索引 (高, 宽), 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 高精度通用索引 / 向量.
pub type Idx2dF = (f64, f64);

/// 掩码与标签图基础数据结构.
mod data;

pub use data::{CompactLabelGrid, LabelGrid, NucleusMask};

pub mod consts;

pub mod conn;

mod error;

pub use error::{AnalysisError, AnalysisResult, Diagnostic};

mod features;

pub use features::{compute_features, ObjectRecord, ObjectTable};

pub mod split;

mod analysis;

pub use analysis::{AnalysisParams, FeatureKind, NucleusAnalysis};

pub mod prelude;
