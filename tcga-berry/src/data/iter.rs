use crate::Idx2d;

/// 行优先索引迭代器.
///
/// 内部只维护一个线性游标, 除法/取模换算出二维索引.
/// 比 `flat_map` 组合出来的迭代器对象小得多, 为性能考虑保留该结构.
#[derive(Debug)]
pub struct PosIter {
    cur: usize,
    len: usize,
    w: usize,
}

impl PosIter {
    #[inline]
    pub fn new((h, w): Idx2d) -> Self {
        Self {
            cur: 0,
            len: h * w,
            w,
        }
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == self.len {
            return None;
        }
        let pos = (self.cur / self.w, self.cur % self.w);
        self.cur += 1;
        Some(pos)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.len - self.cur;
        (rest, Some(rest))
    }
}
