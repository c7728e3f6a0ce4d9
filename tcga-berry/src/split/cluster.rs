//! 点集聚类 collaborator.

use crate::Idx2dF;
use ordered_float::NotNan;

/// 点集聚类的能力抽象: 给定带宽参数, 把一个有限点集划分成
/// 若干个从零开始编号的簇.
///
/// 流水线不关心聚类的具体数值算法, 只依赖如下契约:
///
/// - 返回值与 `points` 等长, 第 `i` 项是第 `i` 个点的簇编号;
/// - 簇编号从 0 开始, 且 `0..=max_id` 中的每个编号都至少出现一次;
/// - 对固定的输入顺序和带宽, 输出必须完全确定.
///   整条流水线的确定性依赖于这一条.
///
/// 违反契约 (长度不符, 或对非空点集返回空划分) 的实现不会让流水线
/// 崩溃: 对应对象会被跳过并记录诊断信息.
pub trait PointClusterer {
    /// 对 `points` 做划分. `bandwidth` 的含义由实现解释,
    /// 但本流水线传入的是 **像素坐标** 下的半径.
    fn cluster(&self, points: &[Idx2dF], bandwidth: f64) -> Vec<usize>;
}

/// 平坦核 mean-shift 聚类.
///
/// 每个点迭代移动到其带宽邻域内所有点的均值处, 直到收敛;
/// 收敛到的模式点相互距离小于半个带宽的归入同一簇,
/// 簇编号按模式点的首次出现顺序分配.
/// 算术过程不含任何随机性, 因此对固定输入严格确定.
///
/// 复杂度为 O(迭代轮数 * n²), 对单个待拆分对象的规模足够用.
#[derive(Copy, Clone, Debug)]
pub struct MeanShiftClusterer {
    /// 每个点的最大迭代轮数.
    pub max_iterations: u32,

    /// 收敛判据: 单轮移动距离 (像素) 小于该值即停止.
    pub tolerance: f64,
}

impl Default for MeanShiftClusterer {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-3,
        }
    }
}

#[inline]
fn dist2((ah, aw): Idx2dF, (bh, bw): Idx2dF) -> f64 {
    (ah - bh) * (ah - bh) + (aw - bw) * (aw - bw)
}

impl MeanShiftClusterer {
    /// 从 `start` 出发做模式搜索, 返回收敛到的模式点.
    fn seek_mode(&self, points: &[Idx2dF], start: Idx2dF, bw2: f64) -> Idx2dF {
        let tol2 = self.tolerance * self.tolerance;
        let mut cur = start;
        for _ in 0..self.max_iterations {
            let mut sum = (0.0, 0.0);
            let mut cnt = 0usize;
            for &p in points {
                if dist2(p, cur) <= bw2 {
                    sum.0 += p.0;
                    sum.1 += p.1;
                    cnt += 1;
                }
            }
            // cnt 不会为 0: 首轮 cur 就是输入点之一; 此后 cur 是
            // 上一轮邻域点的均值, 均值到这些点的平均平方距离不超过
            // 原位置的, 故至少有一个点仍落在带宽内.
            let next = (sum.0 / cnt as f64, sum.1 / cnt as f64);
            let step = dist2(next, cur);
            cur = next;
            if step <= tol2 {
                break;
            }
        }
        cur
    }
}

impl PointClusterer for MeanShiftClusterer {
    fn cluster(&self, points: &[Idx2dF], bandwidth: f64) -> Vec<usize> {
        if points.is_empty() {
            return vec![];
        }
        let bw2 = bandwidth * bandwidth;
        let merge2 = (bandwidth * 0.5) * (bandwidth * 0.5);

        let mut centers: Vec<Idx2dF> = Vec::with_capacity(4);
        points
            .iter()
            .map(|&p| {
                let mode = self.seek_mode(points, p, bw2);
                let nearest = centers
                    .iter()
                    .enumerate()
                    .map(|(id, &c)| (id, dist2(mode, c)))
                    .filter(|&(_, d2)| d2 <= merge2)
                    .min_by_key(|&(_, d2)| NotNan::new(d2).unwrap());
                match nearest {
                    Some((id, _)) => id,
                    None => {
                        centers.push(mode);
                        centers.len() - 1
                    }
                }
            })
            .collect()
    }
}
