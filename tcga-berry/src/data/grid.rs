use super::PosIter;
use crate::consts::LABEL_BACKGROUND;
use crate::Idx2d;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::{Array2, ArrayView2};
use std::io::{Read, Write};
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 拥有所有权的二维标签图.
///
/// 每个像素保存一个非负标签, [`LABEL_BACKGROUND`] (即 0) 代表背景,
/// 正标签代表某个对象. 流水线的每个阶段都整体产出 / 替换该结构.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LabelGrid {
    data: Array2<u32>,
}

impl LabelGrid {
    /// 创建给定形状的全背景标签图.
    #[inline]
    pub fn zeros(shape: Idx2d) -> Self {
        Self {
            data: Array2::zeros(shape),
        }
    }

    /// 直接接管底层数据.
    #[inline]
    pub(crate) fn from_raw(data: Array2<u32>) -> Self {
        Self { data }
    }

    /// 获得底层数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<u32> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<u32> {
        self.data
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

    /// 判断一个索引是否合法 (未越界).
    #[inline]
    pub fn check(&self, (h, w): Idx2d) -> bool {
        let (h_len, w_len) = self.shape();
        h < h_len && w < w_len
    }

    /// 获取给定位置 (高, 宽) 的标签值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&u32> {
        self.data.get(pos)
    }

    /// 判断给定位置是否为背景.
    #[inline]
    pub fn is_background(&self, pos: Idx2d) -> bool {
        self[pos] == LABEL_BACKGROUND
    }

    /// 统计图像中值为 `label` 的像素总个数.
    #[inline]
    pub fn count(&self, label: u32) -> usize {
        self.data.iter().filter(|&p| *p == label).count()
    }

    /// 统计前景 (非背景标签) 像素总个数.
    #[inline]
    pub fn foreground_count(&self) -> usize {
        self.data
            .iter()
            .filter(|&p| *p != LABEL_BACKGROUND)
            .count()
    }

    /// 图像中目前最大的标签值. 全背景图返回 0.
    #[inline]
    pub fn max_label(&self) -> u32 {
        self.data.iter().copied().max().unwrap_or(LABEL_BACKGROUND)
    }

    /// 以行优先规则, 获取能迭代图像所有索引的迭代器.
    #[inline]
    pub fn pos_iter(&self) -> impl Iterator<Item = Idx2d> {
        PosIter::new(self.shape())
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 标签值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u32)> {
        self.data.indexed_iter()
    }

    /// 获得 `pos` 的 4-邻域像素索引. 保证返回的索引都不越界.
    pub fn n4_positions(&self, pos: Idx2d) -> Vec<Idx2d> {
        crate::conn::neighbour4(pos)
            .into_iter()
            .filter(|p| self.check(*p))
            .collect()
    }

    /// 获得 `pos` 的 8-邻域像素索引. 保证返回的索引都不越界.
    pub fn n8_positions(&self, pos: Idx2d) -> Vec<Idx2d> {
        crate::conn::neighbour8(pos)
            .into_iter()
            .filter(|p| self.check(*p))
            .collect()
    }

    /// 将图像转化为行优先的序列化存储.
    pub fn as_row_major_vec(&self) -> Vec<u32> {
        let mut buf = Vec::with_capacity(self.size());
        buf.extend(self.data.iter());
        buf
    }

    /// 压缩数据.
    pub fn compress(&self) -> CompactLabelGrid {
        let mut e = ZlibEncoder::new(Vec::with_capacity(8), Compression::best());
        for label in self.data.iter() {
            e.write_all(&label.to_le_bytes()).expect("Compression error");
        }
        CompactLabelGrid {
            buf: e.finish().expect("Compression error"),
            sh: self.shape(),
        }
    }
}

impl Index<Idx2d> for LabelGrid {
    type Output = u32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for LabelGrid {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// 压缩存储的 [`LabelGrid`]; 不透明类型.
///
/// 用于在内存中便宜地保留大量 tile 的标签图. 不涉及任何磁盘格式.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompactLabelGrid {
    /// 压缩的不透明字节流 (小端 u32 行优先).
    buf: Vec<u8>,

    /// 形状.
    sh: Idx2d,
}

impl CompactLabelGrid {
    /// 解压缩数据.
    pub fn decompress(self) -> LabelGrid {
        let Self { buf, sh: (h, w) } = self;
        let mut d = ZlibDecoder::new(buf.as_slice());
        let mut bytes = Vec::with_capacity(h * w * 4);
        d.read_to_end(&mut bytes).expect("Decompression error");
        debug_assert_eq!(bytes.len(), h * w * 4);
        let labels: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let data = Array2::<u32>::from_shape_vec((h, w), labels).unwrap();
        LabelGrid { data }
    }
}

#[cfg(test)]
mod tests {
    use super::LabelGrid;
    use ndarray::array;

    #[test]
    fn test_counters() {
        let grid = LabelGrid::from_raw(array![[0, 1, 1], [2, 0, 5]]);
        assert_eq!(grid.count(1), 2);
        assert_eq!(grid.count(3), 0);
        assert_eq!(grid.foreground_count(), 4);
        assert_eq!(grid.max_label(), 5);
        assert_eq!(LabelGrid::zeros((3, 3)).max_label(), 0);
    }

    #[test]
    fn test_neighbour_positions_at_corner() {
        let grid = LabelGrid::zeros((3, 3));
        let mut n4 = grid.n4_positions((0, 0));
        n4.sort_unstable();
        assert_eq!(n4, [(0, 1), (1, 0)]);

        let mut n8 = grid.n8_positions((0, 0));
        n8.sort_unstable();
        assert_eq!(n8, [(0, 1), (1, 0), (1, 1)]);

        assert_eq!(grid.n8_positions((1, 1)).len(), 8);
    }

    #[test]
    fn test_compress_roundtrip() {
        let grid = LabelGrid::from_raw(array![[0, 1, 1], [70000, 0, 2]]);
        let back = grid.compress().decompress();
        assert_eq!(grid, back);
    }
}
