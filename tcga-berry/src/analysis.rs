//! 流水线封装: 状态机驱动的掩码分析与查询接口.

use crate::conn::{area_threshold_relabel, label_components, Connectivity};
use crate::consts::{
    DEFAULT_BANDWIDTH_PX, DEFAULT_IRREGULARITY_THRESHOLD, DEFAULT_SIZE_LOWER_THRESHOLD,
    DEFAULT_SIZE_UPPER_THRESHOLD,
};
use crate::features::{compute_features, ObjectTable};
use crate::split::{break_regions, flag_oversized, MeanShiftClusterer, PointClusterer};
use crate::{AnalysisError, AnalysisResult, Diagnostic, LabelGrid, NucleusMask};
use ndarray::{Array2, ArrayView2};
use once_cell::sync::OnceCell;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 流水线的全部可调参数.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisParams {
    /// 对象面积下限 (µm²). 小于该面积的连通分量在特征提取前
    /// 按噪声碎片去除.
    pub size_lower_threshold: f64,

    /// 对象面积上限 (µm²). 超过该面积的对象一定会被拆分
    /// (该准则优先于不规则度, 与形状无关).
    /// 注意过大对象 **不会被丢弃**, 只会被拆分.
    pub size_upper_threshold: f64,

    /// 不规则度 (`周长² / 面积`) 门限, 无量纲.
    ///
    /// 经验调参值, 对不同数据集应显式指定:
    /// 10 会错拆单个细胞核, 100 又拆不开粘连对象,
    /// 默认值 30 来自 TCGA COAD 数据.
    pub irregularity_threshold: f64,

    /// 聚类带宽半径, 单位是 **像素** (作用在原始像素坐标上,
    /// 与 mpp 无关).
    pub bandwidth_px: f64,

    /// 连通分量的邻接规则.
    pub connectivity: Connectivity,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            size_lower_threshold: DEFAULT_SIZE_LOWER_THRESHOLD,
            size_upper_threshold: DEFAULT_SIZE_UPPER_THRESHOLD,
            irregularity_threshold: DEFAULT_IRREGULARITY_THRESHOLD,
            bandwidth_px: DEFAULT_BANDWIDTH_PX,
            connectivity: Connectivity::default(),
        }
    }
}

/// 特征着色视图使用的特征种类.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FeatureKind {
    /// 按对象面积 (µm²) 着色.
    Area,

    /// 按对象不规则度 (`周长² / 面积`) 着色. 零面积对象着 0.
    Irregularity,
}

/// 运行完成后的全部产出.
struct Computed {
    mask: NucleusMask,
    mpp: f64,
    grid: LabelGrid,
    table: ObjectTable,
    count: u32,
    diagnostics: Vec<Diagnostic>,

    // 特征着色视图按需计算并缓存.
    colored_area: OnceCell<Array2<f64>>,
    colored_irregularity: OnceCell<Array2<f64>>,
}

/// 流水线状态机.
enum State {
    /// 尚未提供掩码.
    Unconfigured,

    /// 掩码与 mpp 就绪, 可以运行.
    Configured { mask: NucleusMask, mpp: f64 },

    /// 运行完成, 可以查询. 掩码被保留, 允许再次运行.
    Computed(Box<Computed>),
}

/// 细胞核掩码分析流水线.
///
/// 对象持有一个显式状态机 `Unconfigured -> Configured -> Computed`:
/// 未配置时运行, 或未完成时查询, 都会得到类型化错误
/// 而不是中止进程.
///
/// 完整流程 (见 [`Self::run`]):
/// 连通分量标记 -> 面积下限过滤 + 紧致化 -> 形状特征 ->
/// 拆分判定 -> 聚类拆分 (内部做最终紧致化) -> 重算特征表.
///
/// 聚类 collaborator 默认为 [`MeanShiftClusterer`],
/// 可通过 [`Self::with_clusterer`] 替换为任何
/// [`PointClusterer`] 实现.
pub struct NucleusAnalysis<C = MeanShiftClusterer> {
    params: AnalysisParams,
    clusterer: C,
    state: State,
}

impl NucleusAnalysis<MeanShiftClusterer> {
    /// 以给定参数和默认聚类器创建流水线.
    pub fn new(params: AnalysisParams) -> Self {
        Self::with_clusterer(params, MeanShiftClusterer::default())
    }

    /// 以全默认参数创建流水线.
    pub fn with_defaults() -> Self {
        Self::new(AnalysisParams::default())
    }
}

impl<C: PointClusterer + Sync> NucleusAnalysis<C> {
    /// 以给定参数和自定义聚类 collaborator 创建流水线.
    pub fn with_clusterer(params: AnalysisParams, clusterer: C) -> Self {
        Self {
            params,
            clusterer,
            state: State::Unconfigured,
        }
    }

    /// 当前参数.
    #[inline]
    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    /// 设置输入掩码与物理像素间距 mpp (每像素微米数).
    ///
    /// `mpp` 非正时返回 [`AnalysisError::SpacingNotPositive`],
    /// 此时原有状态 (包括已完成的结果) 保持不变.
    /// 设置成功后进入 `Configured` 状态, 之前的计算结果作废.
    pub fn set_mask(&mut self, mask: NucleusMask, mpp: f64) -> AnalysisResult<()> {
        if mpp <= 0.0 {
            return Err(AnalysisError::SpacingNotPositive(mpp));
        }
        self.state = State::Configured { mask, mpp };
        Ok(())
    }

    /// 运行完整流水线. 每次调用都整体重算标签图和特征表.
    ///
    /// 未配置掩码时返回 [`AnalysisError::NotConfigured`].
    /// 对象级别的非致命事件 (零面积对象, collaborator 失败)
    /// 不会使运行失败, 事后可通过 [`Self::diagnostics`] 查询.
    pub fn run(&mut self) -> AnalysisResult<()> {
        let (mask, mpp) = match std::mem::replace(&mut self.state, State::Unconfigured) {
            State::Unconfigured => return Err(AnalysisError::NotConfigured),
            State::Configured { mask, mpp } => (mask, mpp),
            State::Computed(done) => (done.mask, done.mpp),
        };

        let p = &self.params;
        let mut grid = label_components(&mask, p.connectivity);

        // 面积下限是物理单位, 过滤前换算为像素个数.
        let lower_px = (p.size_lower_threshold / (mpp * mpp)) as usize;
        let n = area_threshold_relabel(&mut grid, lower_px, usize::MAX);

        let table = compute_features(&grid, n, mpp)?;

        let mut diagnostics = Vec::new();
        let flags = flag_oversized(
            &table,
            p.size_upper_threshold,
            p.irregularity_threshold,
            &mut diagnostics,
        );

        let count = break_regions(
            &mut grid,
            &flags,
            &self.clusterer,
            p.bandwidth_px,
            &mut diagnostics,
        );

        log::debug!("过滤后对象 {} 个, 拆分 + 紧致化后 {} 个", n, count);

        // 拆分改变了对象集合; 重算特征表, 保证查询到的特征
        // 与最终标签图一一对应.
        let table = compute_features(&grid, count, mpp)?;

        self.state = State::Computed(Box::new(Computed {
            mask,
            mpp,
            grid,
            table,
            count,
            diagnostics,
            colored_area: OnceCell::new(),
            colored_irregularity: OnceCell::new(),
        }));
        Ok(())
    }

    /// 流水线是否已运行完成.
    #[inline]
    pub fn is_computed(&self) -> bool {
        matches!(self.state, State::Computed(_))
    }

    fn computed(&self) -> AnalysisResult<&Computed> {
        match &self.state {
            State::Computed(done) => Ok(done),
            _ => Err(AnalysisError::NotComputed),
        }
    }

    /// 最终标签图: 0 为背景, 正标签恰为 `1..=n`.
    pub fn label_grid(&self) -> AnalysisResult<&LabelGrid> {
        Ok(&self.computed()?.grid)
    }

    /// 最终对象特征表, 第 `label - 1` 项描述标签 `label`.
    pub fn objects(&self) -> AnalysisResult<&ObjectTable> {
        Ok(&self.computed()?.table)
    }

    /// 最终对象个数.
    pub fn object_count(&self) -> AnalysisResult<u32> {
        Ok(self.computed()?.count)
    }

    /// 本次运行期间记录的对象级诊断信息.
    pub fn diagnostics(&self) -> AnalysisResult<&[Diagnostic]> {
        Ok(&self.computed()?.diagnostics)
    }

    /// 特征着色视图: 每个前景像素被替换为其对象的指定特征值,
    /// 背景为 0. 首次查询时计算, 之后缓存.
    pub fn feature_colored(&self, kind: FeatureKind) -> AnalysisResult<ArrayView2<f64>> {
        let done = self.computed()?;
        let cell = match kind {
            FeatureKind::Area => &done.colored_area,
            FeatureKind::Irregularity => &done.colored_irregularity,
        };
        let img = cell.get_or_init(|| color_by_feature(&done.grid, &done.table, kind));
        Ok(img.view())
    }
}

/// 标签图 + 特征表的纯函数: 生成特征着色视图.
fn color_by_feature(grid: &LabelGrid, table: &ObjectTable, kind: FeatureKind) -> Array2<f64> {
    let mut img = Array2::<f64>::zeros(grid.shape());
    for (pos, &label) in grid.indexed_iter() {
        if label == 0 {
            continue;
        }
        let rec = &table[(label - 1) as usize];
        img[pos] = match kind {
            FeatureKind::Area => rec.area,
            FeatureKind::Irregularity => rec.irregularity().unwrap_or(0.0),
        };
    }
    img
}

#[cfg(test)]
mod tests {
    use super::{AnalysisParams, FeatureKind, NucleusAnalysis};
    use crate::split::PointClusterer;
    use crate::{AnalysisError, Diagnostic, Idx2dF, NucleusMask};
    use std::collections::HashMap;

    fn square_mask() -> NucleusMask {
        // 5x5 图中央一个 3x3 正方形.
        let mut buf = vec![0u8; 25];
        for h in 1..4 {
            for w in 1..4 {
                buf[h * 5 + w] = 1;
            }
        }
        NucleusMask::from_row_major((5, 5), buf)
    }

    /// 哑铃: 两个 10x10 方块由 1 像素宽的桥相连.
    /// 总面积 204 µm² (mpp = 1), 超过默认面积上限.
    fn dumbbell_mask() -> NucleusMask {
        let (h, w) = (10, 24);
        let mut buf = vec![0u8; h * w];
        for r in 0..10 {
            for c in 0..10 {
                buf[r * w + c] = 1; // 左块
                buf[r * w + c + 14] = 1; // 右块
            }
        }
        for c in 10..14 {
            buf[4 * w + c] = 1; // 桥
        }
        NucleusMask::from_row_major((h, w), buf)
    }

    /// 按列坐标一分为二的 pinned collaborator, 测试不依赖
    /// mean-shift 的收敛行为.
    struct HalveClusterer {
        split_at: f64,
    }

    impl PointClusterer for HalveClusterer {
        fn cluster(&self, points: &[Idx2dF], _bandwidth: f64) -> Vec<usize> {
            points
                .iter()
                .map(|&(_, w)| usize::from(w >= self.split_at))
                .collect()
        }
    }

    struct BrokenClusterer;

    impl PointClusterer for BrokenClusterer {
        fn cluster(&self, _points: &[Idx2dF], _bandwidth: f64) -> Vec<usize> {
            vec![]
        }
    }

    #[test]
    fn test_run_before_configure() {
        let mut ana = NucleusAnalysis::with_defaults();
        assert_eq!(ana.run(), Err(AnalysisError::NotConfigured));
    }

    #[test]
    fn test_query_before_run() {
        let mut ana = NucleusAnalysis::with_defaults();
        assert_eq!(ana.label_grid().unwrap_err(), AnalysisError::NotComputed);
        assert_eq!(ana.objects().unwrap_err(), AnalysisError::NotComputed);

        ana.set_mask(square_mask(), 1.0).unwrap();
        assert!(!ana.is_computed());
        assert_eq!(ana.object_count().unwrap_err(), AnalysisError::NotComputed);
        assert_eq!(
            ana.feature_colored(FeatureKind::Area).unwrap_err(),
            AnalysisError::NotComputed
        );
    }

    #[test]
    fn test_invalid_spacing_rejected_without_state_change() {
        let mut ana = NucleusAnalysis::with_defaults();
        ana.set_mask(square_mask(), 1.0).unwrap();
        ana.run().unwrap();

        // 无效 mpp 被拒绝, 已有结果不受影响.
        assert_eq!(
            ana.set_mask(square_mask(), 0.0),
            Err(AnalysisError::SpacingNotPositive(0.0))
        );
        assert_eq!(
            ana.set_mask(square_mask(), -0.25),
            Err(AnalysisError::SpacingNotPositive(-0.25))
        );
        assert!(ana.is_computed());
        assert_eq!(ana.object_count().unwrap(), 1);
    }

    #[test]
    fn test_all_background_grid() {
        let mut ana = NucleusAnalysis::with_defaults();
        ana.set_mask(NucleusMask::from_row_major((10, 10), vec![0; 100]), 0.5)
            .unwrap();
        ana.run().unwrap();

        assert_eq!(ana.object_count().unwrap(), 0);
        assert!(ana.objects().unwrap().is_empty());
        assert_eq!(ana.label_grid().unwrap().foreground_count(), 0);
        assert!(ana.diagnostics().unwrap().is_empty());
    }

    #[test]
    fn test_single_square() {
        let mut ana = NucleusAnalysis::with_defaults();
        ana.set_mask(square_mask(), 1.0).unwrap();
        ana.run().unwrap();

        assert_eq!(ana.object_count().unwrap(), 1);
        let table = ana.objects().unwrap();
        assert_eq!(table[0].pixel_count, 9);
        assert!((table[0].area - 9.0).abs() < 1e-10);
        assert!((table[0].perimeter - 12.0).abs() < 1e-10);
        // 小而紧凑, 不触发拆分.
        assert!(ana.diagnostics().unwrap().is_empty());
    }

    #[test]
    fn test_noise_fragment_removed_by_lower_bound() {
        // 3x3 正方形加一个孤立像素; 默认下限 3 µm², mpp = 1
        // 时孤立像素被当作噪声去除.
        let mut buf = vec![0u8; 49];
        for h in 1..4 {
            for w in 1..4 {
                buf[h * 7 + w] = 1;
            }
        }
        buf[6 * 7 + 6] = 1;
        let mask = NucleusMask::from_row_major((7, 7), buf);

        let mut ana = NucleusAnalysis::with_defaults();
        ana.set_mask(mask, 1.0).unwrap();
        ana.run().unwrap();

        assert_eq!(ana.object_count().unwrap(), 1);
        let grid = ana.label_grid().unwrap();
        // 被去除的像素回归背景, 存活像素总数等于对象像素数之和.
        assert_eq!(grid[(6, 6)], 0);
        assert_eq!(grid.foreground_count(), 9);
        let sum: usize = ana.objects().unwrap().iter().map(|r| r.pixel_count).sum();
        assert_eq!(sum, 9);
    }

    #[test]
    fn test_two_disjoint_squares() {
        let mask = NucleusMask::from_row_major(
            (3, 7),
            vec![
                1, 1, 1, 0, 1, 1, 1, //
                1, 1, 1, 0, 1, 1, 1, //
                1, 1, 1, 0, 1, 1, 1,
            ],
        );
        let mut ana = NucleusAnalysis::with_defaults();
        ana.set_mask(mask, 1.0).unwrap();
        ana.run().unwrap();

        assert_eq!(ana.object_count().unwrap(), 2);
        let grid = ana.label_grid().unwrap();
        assert_eq!(grid[(0, 0)], 1);
        assert_eq!(grid[(0, 4)], 2);
        let table = ana.objects().unwrap();
        assert_eq!(table[0], table[1]);
    }

    /// 紧致化后标签恰为 `{1..=n}` 且只覆盖前景像素.
    #[test]
    fn test_label_cover_invariant() {
        let mask = NucleusMask::from_row_major(
            (4, 6),
            vec![
                1, 0, 1, 1, 0, 1, //
                1, 0, 0, 1, 0, 1, //
                0, 0, 1, 0, 0, 0, //
                1, 1, 1, 0, 1, 1,
            ],
        );
        let fg = mask.nucleus_count();

        // 下限设 0 保留所有碎片, 门限设到无穷大避免触发拆分.
        let params = AnalysisParams {
            size_lower_threshold: 0.0,
            size_upper_threshold: f64::INFINITY,
            irregularity_threshold: f64::INFINITY,
            ..Default::default()
        };
        let mut ana = NucleusAnalysis::new(params);
        ana.set_mask(mask, 1.0).unwrap();
        ana.run().unwrap();

        let n = ana.object_count().unwrap();
        let grid = ana.label_grid().unwrap();
        assert_eq!(grid.foreground_count(), fg);
        for label in 1..=n {
            assert!(grid.count(label) > 0);
        }
        assert_eq!(grid.max_label(), n);
        assert_eq!(ana.objects().unwrap().len(), n as usize);
    }

    /// 哑铃对象被面积准则标记, 拆分后标签全局唯一且像素总数不变.
    #[test]
    fn test_dumbbell_is_split() {
        let mask = dumbbell_mask();
        let total = mask.nucleus_count();
        assert_eq!(total, 204);

        let mut ana = NucleusAnalysis::with_clusterer(
            AnalysisParams::default(),
            HalveClusterer { split_at: 12.0 },
        );
        ana.set_mask(mask, 1.0).unwrap();
        ana.run().unwrap();

        let n = ana.object_count().unwrap();
        assert_eq!(n, 2);

        let grid = ana.label_grid().unwrap();
        assert_eq!(grid.foreground_count(), total);

        let mut sizes: HashMap<u32, usize> = HashMap::new();
        for (_, &label) in grid.indexed_iter() {
            if label != 0 {
                *sizes.entry(label).or_insert(0) += 1;
            }
        }
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes.values().sum::<usize>(), total);
        // 特征表与最终标签图一致.
        let table = ana.objects().unwrap();
        assert_eq!(table.len(), 2);
        for label in 1..=2u32 {
            assert_eq!(table[(label - 1) as usize].pixel_count, sizes[&label]);
        }
    }

    #[test]
    fn test_collaborator_failure_is_diagnosed() {
        simple_logger::SimpleLogger::new().init().ok();
        let mask = dumbbell_mask();
        let mut ana =
            NucleusAnalysis::with_clusterer(AnalysisParams::default(), BrokenClusterer);
        ana.set_mask(mask, 1.0).unwrap();
        ana.run().unwrap();

        // 拆分失败的对象保持原样.
        assert_eq!(ana.object_count().unwrap(), 1);
        assert_eq!(
            ana.diagnostics().unwrap(),
            [Diagnostic::CollaboratorFailure {
                label: 1,
                points: 204,
            }]
            .as_slice()
        );
    }

    #[test]
    fn test_feature_colored_views() {
        let mut ana = NucleusAnalysis::with_defaults();
        ana.set_mask(square_mask(), 1.0).unwrap();
        ana.run().unwrap();

        let area = ana.feature_colored(FeatureKind::Area).unwrap();
        assert_eq!(area[(2, 2)], 9.0);
        assert_eq!(area[(0, 0)], 0.0);

        let irr = ana.feature_colored(FeatureKind::Irregularity).unwrap();
        assert!((irr[(2, 2)] - 16.0).abs() < 1e-10);

        // 第二次查询命中缓存, 结果一致.
        let again = ana.feature_colored(FeatureKind::Area).unwrap();
        assert_eq!(area, again);
    }

    #[test]
    fn test_rerun_recomputes() {
        let mut ana = NucleusAnalysis::with_defaults();
        ana.set_mask(square_mask(), 1.0).unwrap();
        ana.run().unwrap();
        assert_eq!(ana.object_count().unwrap(), 1);

        // Computed 状态下允许直接再跑一次.
        ana.run().unwrap();
        assert_eq!(ana.object_count().unwrap(), 1);

        // 重新配置后旧结果作废.
        ana.set_mask(NucleusMask::from_row_major((4, 4), vec![0; 16]), 2.0)
            .unwrap();
        assert!(!ana.is_computed());
        ana.run().unwrap();
        assert_eq!(ana.object_count().unwrap(), 0);
    }
}
