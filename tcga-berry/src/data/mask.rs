use super::PosIter;
use crate::consts::gray::*;
use crate::Idx2d;
use ndarray::{Array2, ArrayView2};
use std::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 拥有所有权的细胞核二值掩码.
///
/// 掩码一经构造即不可变: 流水线的所有阶段都只读取它.
/// 像素值只有 [`MASK_BACKGROUND`] 和 [`MASK_NUCLEUS`] 两种,
/// 构造时任何非零输入都会被钳制为前景.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NucleusMask {
    data: Array2<u8>,
}

impl NucleusMask {
    /// 从任意单通道图像构造掩码. 非零像素被视为前景并钳制为
    /// [`MASK_NUCLEUS`], 零像素保持为背景.
    pub fn new(raw: Array2<u8>) -> Self {
        let data = raw.mapv(|p| if p == MASK_BACKGROUND {
            MASK_BACKGROUND
        } else {
            MASK_NUCLEUS
        });
        Self { data }
    }

    /// 从行优先序列化数据构造掩码. 非零像素同样被钳制为前景.
    ///
    /// 如果 `buf.len() != h * w`, 则程序 panic.
    pub fn from_row_major((h, w): Idx2d, buf: Vec<u8>) -> Self {
        assert_eq!(buf.len(), h * w, "掩码大小不符");
        Self::new(Array2::from_shape_vec((h, w), buf).unwrap())
    }

    /// 获得底层数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<u8> {
        self.data.view()
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 获得图像的高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 获得图像的宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&u8> {
        self.data.get(pos)
    }

    /// 该图是否为全背景图?
    #[inline]
    pub fn is_all_background(&self) -> bool {
        self.data.iter().copied().all(is_background)
    }

    /// 统计前景像素总个数.
    #[inline]
    pub fn nucleus_count(&self) -> usize {
        self.data.iter().copied().filter(|p| is_nucleus(*p)).count()
    }

    /// 以行优先规则, 获取能迭代图像所有索引的迭代器.
    #[inline]
    pub fn pos_iter(&self) -> impl Iterator<Item = Idx2d> {
        PosIter::new(self.shape())
    }
}

impl Index<Idx2d> for NucleusMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}
