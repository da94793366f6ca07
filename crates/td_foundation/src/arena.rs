// crates/td_foundation/src/arena.rs

//! 只追加 Arena 与强类型句柄
//!
//! 追踪特征图中的所有节点都存放在一个 Arena 中，节点之间的父子关系、
//! 记忆化映射都只保存句柄（`Idx<Tag>`），从不持有所有权。
//!
//! # 设计目标
//!
//! - **句柄稳定**: 元素只追加不删除，句柄在整个分析周期内有效
//! - **类型安全**: 通过标记类型防止不同 Arena 的句柄混用
//! - **可重映射**: 深拷贝时通过 [`HandleMap`] 重写所有交叉引用
//!
//! # 示例
//!
//! ```
//! use td_foundation::arena::{Arena, ArenaTag};
//!
//! #[derive(Debug, Clone, Copy)]
//! struct NodeTag;
//! impl ArenaTag for NodeTag {}
//!
//! let mut arena: Arena<&str, NodeTag> = Arena::new();
//! let a = arena.push("a");
//! let b = arena.push("b");
//! assert_eq!(arena[a], "a");
//! assert_eq!(arena.len(), 2);
//! assert_ne!(a, b);
//! ```

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

// ============================================================================
// 标记类型
// ============================================================================

/// Arena 标记 trait，用于在类型层面区分不同用途的句柄
pub trait ArenaTag: 'static + Copy + Send + Sync {}

// ============================================================================
// 句柄类型
// ============================================================================

/// 轻量级类型安全句柄（4 字节）
///
/// 使用 `PhantomData<fn() -> Tag>` 使句柄对任意 `Tag` 都是 `Copy + Send + Sync`。
/// 比较与哈希只看序号，不要求 `Tag` 实现对应 trait。
#[repr(transparent)]
pub struct Idx<Tag> {
    index: u32,
    _marker: PhantomData<fn() -> Tag>,
}

impl<Tag> Copy for Idx<Tag> {}

impl<Tag> Clone for Idx<Tag> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<Tag> PartialEq for Idx<Tag> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<Tag> Eq for Idx<Tag> {}

impl<Tag> PartialOrd for Idx<Tag> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<Tag> Ord for Idx<Tag> {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<Tag> std::hash::Hash for Idx<Tag> {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<Tag> std::fmt::Debug for Idx<Tag> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Idx").field(&self.index).finish()
    }
}

impl<Tag> Idx<Tag> {
    /// 无效句柄
    pub const INVALID: Self = Self {
        index: u32::MAX,
        _marker: PhantomData,
    };

    /// 由原始序号创建句柄
    #[inline]
    pub const fn new(index: u32) -> Self {
        debug_assert!(index != u32::MAX, "u32::MAX 保留给 INVALID");
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// 原始序号
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// 转换为 `usize`
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.index as usize
    }

    /// 是否有效
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.index != u32::MAX
    }
}

impl<Tag> Default for Idx<Tag> {
    #[inline]
    fn default() -> Self {
        Self::INVALID
    }
}

impl<Tag> std::fmt::Display for Idx<Tag> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.index)
        } else {
            f.write_str("#invalid")
        }
    }
}

// ============================================================================
// Arena 实现
// ============================================================================

/// 只追加的内存池
///
/// 与可回收槽位的 Arena 不同，这里的元素一经插入便存活到 Arena 本身被丢弃，
/// 这正是追踪特征图需要的语义：主列表是特征的唯一所有者。
#[derive(Debug, Clone)]
pub struct Arena<T, Tag: ArenaTag> {
    items: Vec<T>,
    _marker: PhantomData<Tag>,
}

impl<T, Tag: ArenaTag> Default for Arena<T, Tag> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, Tag: ArenaTag> Arena<T, Tag> {
    /// 创建空 Arena
    #[inline]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// 创建指定容量的 Arena
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    /// 元素数量
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 追加元素并返回其句柄
    pub fn push(&mut self, value: T) -> Idx<Tag> {
        let idx = Idx::new(self.items.len() as u32);
        self.items.push(value);
        idx
    }

    /// 获取元素引用
    #[inline]
    pub fn get(&self, idx: Idx<Tag>) -> Option<&T> {
        if idx.is_valid() {
            self.items.get(idx.as_usize())
        } else {
            None
        }
    }

    /// 获取元素可变引用
    #[inline]
    pub fn get_mut(&mut self, idx: Idx<Tag>) -> Option<&mut T> {
        if idx.is_valid() {
            self.items.get_mut(idx.as_usize())
        } else {
            None
        }
    }

    /// 句柄是否指向已存在的元素
    #[inline]
    pub fn contains(&self, idx: Idx<Tag>) -> bool {
        idx.is_valid() && idx.as_usize() < self.items.len()
    }

    /// 按插入顺序迭代 `(句柄, 元素)`
    pub fn iter(&self) -> impl Iterator<Item = (Idx<Tag>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| (Idx::new(i as u32), v))
    }

    /// 按插入顺序迭代所有句柄
    pub fn indices(&self) -> impl Iterator<Item = Idx<Tag>> {
        (0..self.items.len() as u32).map(Idx::new)
    }

    /// 按插入顺序逐个转换元素，生成同构的新 Arena
    ///
    /// 新 Arena 中第 i 个元素与原 Arena 第 i 个元素对应，返回的 [`HandleMap`]
    /// 记录新旧句柄的对应关系，调用方据此重写元素内部的交叉引用。
    pub fn map_clone<U>(&self, mut f: impl FnMut(&T) -> U) -> (Arena<U, Tag>, HandleMap<Tag>) {
        let mut out = Arena::with_capacity(self.items.len());
        let mut map = HandleMap::with_capacity(self.items.len());
        for (old, value) in self.iter() {
            let new = out.push(f(value));
            map.insert(old, new);
        }
        (out, map)
    }
}

impl<T, Tag: ArenaTag> Index<Idx<Tag>> for Arena<T, Tag> {
    type Output = T;

    #[inline]
    fn index(&self, idx: Idx<Tag>) -> &T {
        &self.items[idx.as_usize()]
    }
}

impl<T, Tag: ArenaTag> IndexMut<Idx<Tag>> for Arena<T, Tag> {
    #[inline]
    fn index_mut(&mut self, idx: Idx<Tag>) -> &mut T {
        &mut self.items[idx.as_usize()]
    }
}

// ============================================================================
// 句柄映射
// ============================================================================

/// 旧句柄到新句柄的映射表
///
/// 由深拷贝生成；未登记的句柄映射为 [`Idx::INVALID`]。
#[derive(Debug, Clone)]
pub struct HandleMap<Tag> {
    table: Vec<Idx<Tag>>,
}

impl<Tag> Default for HandleMap<Tag> {
    fn default() -> Self {
        Self { table: Vec::new() }
    }
}

impl<Tag> HandleMap<Tag> {
    /// 创建指定容量的映射表
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: Vec::with_capacity(capacity),
        }
    }

    /// 登记一对句柄
    pub fn insert(&mut self, old: Idx<Tag>, new: Idx<Tag>) {
        let slot = old.as_usize();
        if slot >= self.table.len() {
            self.table.resize(slot + 1, Idx::INVALID);
        }
        self.table[slot] = new;
    }

    /// 查询新句柄
    #[inline]
    pub fn get(&self, old: Idx<Tag>) -> Idx<Tag> {
        self.table
            .get(old.as_usize())
            .copied()
            .unwrap_or(Idx::INVALID)
    }

    /// 已登记数量
    #[inline]
    pub fn len(&self) -> usize {
        self.table.iter().filter(|h| h.is_valid()).count()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct TestTag;
    impl ArenaTag for TestTag {}

    #[test]
    fn test_idx_size() {
        assert_eq!(std::mem::size_of::<Idx<TestTag>>(), 4);
    }

    #[test]
    fn test_idx_compare_without_tag_traits() {
        #[derive(Clone, Copy)]
        struct BareTag;
        impl ArenaTag for BareTag {}

        let a: Idx<BareTag> = Idx::new(1);
        let b: Idx<BareTag> = Idx::new(2);
        assert_eq!(a, Idx::new(1));
        assert_ne!(a, b);
        assert!(a < b);
        let set: std::collections::HashSet<_> = [a, b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_idx_invalid() {
        let idx: Idx<TestTag> = Idx::default();
        assert!(!idx.is_valid());
        assert_eq!(idx.to_string(), "#invalid");
        assert_eq!(Idx::<TestTag>::new(3).to_string(), "#3");
    }

    #[test]
    fn test_push_get() {
        let mut arena: Arena<i32, TestTag> = Arena::new();
        let a = arena.push(10);
        let b = arena.push(20);

        assert_eq!(arena.get(a), Some(&10));
        assert_eq!(arena[b], 20);
        assert_eq!(arena.get(Idx::INVALID), None);
        assert_eq!(arena.get(Idx::new(7)), None);
        assert!(arena.contains(b));
        assert!(!arena.contains(Idx::new(2)));
    }

    #[test]
    fn test_get_mut() {
        let mut arena: Arena<i32, TestTag> = Arena::new();
        let a = arena.push(1);
        if let Some(v) = arena.get_mut(a) {
            *v = 5;
        }
        arena[a] += 1;
        assert_eq!(arena[a], 6);
    }

    #[test]
    fn test_iter_order() {
        let mut arena: Arena<char, TestTag> = Arena::new();
        for c in ['x', 'y', 'z'] {
            arena.push(c);
        }
        let collected: Vec<_> = arena.iter().map(|(i, c)| (i.index(), *c)).collect();
        assert_eq!(collected, vec![(0, 'x'), (1, 'y'), (2, 'z')]);
        assert_eq!(arena.indices().count(), 3);
    }

    #[test]
    fn test_map_clone() {
        let mut arena: Arena<i32, TestTag> = Arena::new();
        let a = arena.push(1);
        let b = arena.push(2);

        let (copy, map) = arena.map_clone(|v| v * 10);
        assert_eq!(copy.len(), 2);
        assert_eq!(copy[map.get(a)], 10);
        assert_eq!(copy[map.get(b)], 20);
        assert_eq!(map.len(), 2);
        assert!(!map.get(Idx::new(9)).is_valid());
    }
}
