//! 通用常量.

/// 单通道掩码颜色.
pub mod gray {
    /// 二值掩码中, 背景的像素值.
    pub const MASK_BACKGROUND: u8 = 0;

    /// 二值掩码中, 细胞核前景的像素值.
    ///
    /// 掩码构造时, 任何非零输入像素都会被钳制为该值.
    pub const MASK_NUCLEUS: u8 = 1;

    /// 像素是否是前景?
    #[inline]
    pub const fn is_nucleus(p: u8) -> bool {
        matches!(p, MASK_NUCLEUS)
    }

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, MASK_BACKGROUND)
    }
}

/// 标签图中背景的标签值.
pub const LABEL_BACKGROUND: u32 = 0;

/// 对象面积下限的默认值 (单位: µm²).
///
/// 最小的细胞 (精子, 中性粒细胞, 血小板等, 可以视为细胞碎片)
/// 单边尺度在 3 µm 左右, 小于该面积的连通分量按噪声丢弃.
pub const DEFAULT_SIZE_LOWER_THRESHOLD: f64 = 3.0;

/// 对象面积上限的默认值 (单位: µm²). 超过该面积的对象一定会被拆分.
pub const DEFAULT_SIZE_UPPER_THRESHOLD: f64 = 200.0;

/// 不规则度 (`周长² / 面积`, 无量纲) 门限的默认值.
///
/// 该值针对 TCGA COAD A6-2671 调参得到: 10 会错拆单个细胞核,
/// 100 又拆不开应该拆的粘连对象. 不同数据集应自行调整.
pub const DEFAULT_IRREGULARITY_THRESHOLD: f64 = 30.0;

/// 聚类带宽半径的默认值 (单位: 像素).
///
/// 注意带宽作用在 **原始像素坐标** 上, 与 mpp 无关
/// (与面积 / 周长门限使用的物理单位不同).
pub const DEFAULT_BANDWIDTH_PX: f64 = 20.0;
