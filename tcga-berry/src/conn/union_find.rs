//! 基于索引 arena 的并查集.

/// 并查集 (union-find / disjoint-set).
///
/// 内部只有两个与图像等大的索引数组, 不含任何指针:
/// `parent[i]` 指向 `i` 的父节点 (根节点指向自身),
/// `size[i]` 在 `i` 为根时记录其集合的元素个数.
/// `find` 做路径压缩, `union` 按集合大小合并,
/// 因此整体摊还复杂度接近线性.
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<u32>,
    size: Vec<u32>,
}

impl UnionFind {
    /// 创建 `n` 个独立元素 (每个元素自成一个集合).
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
            size: vec![1; n],
        }
    }

    /// 元素总个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// 查找 `x` 所在集合的根, 并沿途做路径压缩.
    pub fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // 第二趟: 把路径上的所有节点直接挂到根上.
        let mut cur = x;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    /// 合并 `x` 和 `y` 所在的集合, 按大小合并. 返回合并后的根.
    pub fn union(&mut self, x: u32, y: u32) -> u32 {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return rx;
        }
        let (big, small) = if self.size[rx as usize] >= self.size[ry as usize] {
            (rx, ry)
        } else {
            (ry, rx)
        };
        self.parent[small as usize] = big;
        self.size[big as usize] += self.size[small as usize];
        big
    }

    /// 判断两个元素是否属于同一集合.
    #[inline]
    pub fn connected(&mut self, x: u32, y: u32) -> bool {
        self.find(x) == self.find(y)
    }

    /// `x` 所在集合的元素个数.
    #[inline]
    pub fn set_size(&mut self, x: u32) -> u32 {
        let root = self.find(x);
        self.size[root as usize]
    }
}
