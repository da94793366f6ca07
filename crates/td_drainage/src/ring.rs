// crates/td_drainage/src/ring.rs

//! 边界环
//!
//! 洼地在当前水位下的一条边界回路：网格顶点的有序循环序列，
//! 水面始终位于 `points[i] → points[i+1]` 的左侧。
//! 外环逆时针，岛环顺时针。
//!
//! 环在扩展过程中可能退化为 1 点（孤立高点）或 2 点（孤立的边），
//! 也可能在某个顶点处自相接触（同一顶点出现多次），这些情况由洼地扩展算法处理。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use td_geo::polygon::signed_area;
use td_tin::TinAccess;

/// 环的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RingLocation {
    /// 外边界
    Outer,
    /// 岛
    Inner,
    /// 分裂后尚未分类
    Unknown,
}

/// 洼地出口：出口点及其在边界环上的前后点
///
/// 前后点决定了出口外侧扇区（从 `prior` 逆时针到 `next`），溢出追踪从这里继续。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PondExitInfo {
    /// 出口点
    pub exit_point: u32,
    /// 环上前一点
    pub prior: u32,
    /// 环上后一点
    pub next: u32,
}

/// 边界环
#[derive(Debug, Clone)]
pub struct BoundaryRing {
    points: Vec<u32>,
    counts: HashMap<u32, u32>,
    /// 分类
    pub location: RingLocation,
    /// 已找到出口，不再扩展
    pub finished: bool,
    /// 本环上找到的出口
    pub exits: Vec<PondExitInfo>,
}

impl BoundaryRing {
    /// 由顶点序列创建
    pub fn new(points: Vec<u32>, location: RingLocation) -> Self {
        let mut counts = HashMap::with_capacity(points.len());
        for &p in &points {
            *counts.entry(p).or_insert(0) += 1;
        }
        Self {
            points,
            counts,
            location,
            finished: false,
            exits: Vec::new(),
        }
    }

    /// 顶点序列
    #[inline]
    pub fn points(&self) -> &[u32] {
        &self.points
    }

    /// 顶点数
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 第 i 个顶点
    #[inline]
    pub fn at(&self, i: usize) -> u32 {
        self.points[i]
    }

    /// 后继位置
    #[inline]
    pub fn next_index(&self, i: usize) -> usize {
        if i + 1 >= self.points.len() {
            0
        } else {
            i + 1
        }
    }

    /// 前驱位置
    #[inline]
    pub fn prev_index(&self, i: usize) -> usize {
        if i == 0 {
            self.points.len().saturating_sub(1)
        } else {
            i - 1
        }
    }

    /// 是否包含顶点
    #[inline]
    pub fn contains(&self, p: u32) -> bool {
        self.counts.contains_key(&p)
    }

    /// 顶点出现次数
    #[inline]
    pub fn occurrences(&self, p: u32) -> u32 {
        self.counts.get(&p).copied().unwrap_or(0)
    }

    /// 顶点第一次出现的位置（从 `from` 开始向后循环查找，跳过 `from` 本身）
    pub fn find_other(&self, p: u32, from: usize) -> Option<usize> {
        let n = self.points.len();
        (1..n).map(|k| (from + k) % n).find(|&k| self.points[k] == p)
    }

    /// 在位置 i 之后插入顶点，返回新顶点的位置
    pub fn insert_after(&mut self, i: usize, p: u32) -> usize {
        let at = if self.points.is_empty() { 0 } else { i + 1 };
        self.points.insert(at, p);
        *self.counts.entry(p).or_insert(0) += 1;
        at
    }

    /// 删除位置 i 的顶点
    pub fn remove(&mut self, i: usize) -> u32 {
        let p = self.points.remove(i);
        if let Some(c) = self.counts.get_mut(&p) {
            *c -= 1;
            if *c == 0 {
                self.counts.remove(&p);
            }
        }
        p
    }

    /// 在同一顶点的两次出现 `a`、`b` 处把环拆成两条
    ///
    /// 本环保留从 `a` 向后到 `b` 之前的部分，返回从 `b` 向后到 `a` 之前的部分。
    /// 两部分都以该顶点开头。
    pub fn split_off(&mut self, a: usize, b: usize) -> Vec<u32> {
        let n = self.points.len();
        self.points.rotate_left(a);
        let b = (b + n - a) % n;
        let tail = self.points.split_off(b);
        self.rebuild_counts();
        tail
    }

    /// 反转方向
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// 最小顶点编号
    pub fn min_point(&self) -> Option<u32> {
        self.points.iter().copied().min()
    }

    /// 平面有向面积（逆时针为正）
    pub fn signed_area<M: TinAccess + ?Sized>(&self, tin: &M) -> f64 {
        let coords: Vec<_> = self.points.iter().map(|&p| tin.point(p).xy()).collect();
        signed_area(&coords)
    }

    /// 出口只保留属于本环的部分
    pub fn retain_exits(&mut self) {
        let counts = &self.counts;
        self.exits.retain(|e| counts.contains_key(&e.exit_point));
    }

    fn rebuild_counts(&mut self) {
        self.counts.clear();
        for &p in &self.points {
            *self.counts.entry(p).or_insert(0) += 1;
        }
    }
}
