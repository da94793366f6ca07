// crates/td_drainage/src/tables.rs

//! 排水查找表
//!
//! 预计算的三角形水文属性与已知洼地出口，按键排序后二分查找。
//! 查找表只是缓存：任何查询都可以返回 `None`，引擎会直接计算。
//! 表中记录建表时三角网的快照，快照不一致时整张表失效。

use serde::{Deserialize, Serialize};
use td_geo::plane::triangle_hydrology;
use td_geo::TriangleHydrology;
use td_tin::TinAccess;
use tracing::debug;

use crate::ring::PondExitInfo;

/// 三角网快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TinSnapshot {
    /// 顶点数
    pub n_points: usize,
    /// 三角形数
    pub n_triangles: usize,
    /// 修改戳
    pub stamp: u64,
}

impl TinSnapshot {
    /// 记录三角网当前状态
    pub fn of<M: TinAccess + ?Sized>(tin: &M) -> Self {
        Self {
            n_points: tin.n_points(),
            n_triangles: tin.n_triangles(),
            stamp: tin.stamp(),
        }
    }
}

/// 已知出口的键：低点或平边
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PondKey {
    /// 低点
    Point(u32),
    /// 平边（小编号在前）
    Line(u32, u32),
}

impl PondKey {
    /// 平边键，端点顺序无关
    pub fn line(a: u32, b: u32) -> Self {
        Self::Line(a.min(b), a.max(b))
    }
}

/// 排水查找表
#[derive(Debug, Clone)]
pub struct DrainageTables {
    snapshot: TinSnapshot,
    triangles: Vec<([u32; 3], TriangleHydrology)>,
    pond_exits: Vec<(PondKey, PondExitInfo)>,
}

impl DrainageTables {
    /// 为三角网的全部三角形预计算水文属性
    pub fn build<M: TinAccess + ?Sized>(tin: &M) -> Self {
        let mut triangles = Vec::with_capacity(tin.n_triangles());
        let mut skipped = 0usize;
        for t in tin.triangles() {
            let (a, b, c) = (tin.point(t[0]), tin.point(t[1]), tin.point(t[2]));
            match triangle_hydrology(&a, &b, &c) {
                Ok(h) => triangles.push((t, h)),
                Err(_) => skipped += 1,
            }
        }
        triangles.sort_by_key(|(t, _)| *t);
        debug!(triangles = triangles.len(), skipped, "排水查找表构建完成");
        Self {
            snapshot: TinSnapshot::of(tin),
            triangles,
            pond_exits: Vec::new(),
        }
    }

    /// 建表时的快照
    #[inline]
    pub fn snapshot(&self) -> TinSnapshot {
        self.snapshot
    }

    /// 表是否与三角网当前状态一致
    pub fn is_valid_for<M: TinAccess + ?Sized>(&self, tin: &M) -> bool {
        self.snapshot == TinSnapshot::of(tin)
    }

    /// 三角形数
    #[inline]
    pub fn n_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// 逆时针三角形 `(a, b, c)` 的水文属性，边水流方向按查询顺序排列
    pub fn triangle_hydrology(&self, a: u32, b: u32, c: u32) -> Option<TriangleHydrology> {
        // 旋转到最小编号在前，保持绕向
        let (key, shift) = if a < b && a < c {
            ([a, b, c], 0)
        } else if b < c {
            ([b, c, a], 1)
        } else {
            ([c, a, b], 2)
        };
        let i = self.triangles.binary_search_by_key(&key, |(t, _)| *t).ok()?;
        let mut h = self.triangles[i].1;
        let stored = h.edge_flow;
        for k in 0..3 {
            h.edge_flow[k] = stored[(k + 3 - shift) % 3];
        }
        Some(h)
    }

    /// 记录已知洼地出口
    pub fn insert_known_pond_exit(&mut self, key: PondKey, exit: PondExitInfo) {
        match self.pond_exits.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(i) => self.pond_exits[i].1 = exit,
            Err(i) => self.pond_exits.insert(i, (key, exit)),
        }
    }

    /// 已知洼地出口
    pub fn known_pond_exit(&self, key: PondKey) -> Option<PondExitInfo> {
        self.pond_exits
            .binary_search_by_key(&key, |(k, _)| *k)
            .ok()
            .map(|i| self.pond_exits[i].1)
    }
}
