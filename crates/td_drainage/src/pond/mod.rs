// crates/td_drainage/src/pond/mod.rs

//! 洼地边界集（PondAnalysis）
//!
//! 一个洼地由若干边界环描述：一条外环和零到多条岛环。水位上升时
//! 边界环向外扩展，淹没的三角形计入体积，直到外环上出现出口。
//!
//! # 模块概览
//!
//! - `seed`: 由低点/平边/平三角形/出口区域构建初始边界环
//! - `expand`: 按高程扩展边界环、环分裂、出口检测
//! - `volume`: 体积累计、按体积充水与水位求解
//! - `polygon`: 按高程切出水面多边形
//!
//! # 体积约定
//!
//! - `current_volume` / `current_area`: 所有顶点都不在任何环上的三角形（完全淹没），
//!   在 `current_z` 处的蓄水量与面积
//! - 环上顶点的湿侧扇区三角形（跨水线）每次按需用挖填方核重新计算
//! - `volume_at(z) = current_volume + current_area·(z - current_z) + side_volume(z)`，
//!   在 `current_z` 与下一个环上高程之间精确成立

mod expand;
mod polygon;
mod seed;
mod volume;

use serde::{Deserialize, Serialize};
use td_tin::TinAccess;

use crate::error::{DrainageError, DrainageResult};
use crate::ring::{BoundaryRing, PondExitInfo, RingLocation};

pub use volume::RefineBracket;

/// 洼地种子
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PondSeed {
    /// 单个低点
    Point(u32),
    /// 平边（两端等高）
    Edge(u32, u32),
    /// 平三角形（三点等高）
    Triangle(u32, u32, u32),
    /// 死洼地合并：从出口点处等高以下的连通区域开始
    Exit {
        /// 出口点
        exit_point: u32,
        /// 被合并洼地中最低的底部高程
        bottom_z: f64,
    },
}

/// 洼地种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PondKind {
    /// 低点洼地
    LowPoint,
    /// 平边洼地
    Edge,
    /// 平三角形洼地
    Triangle,
    /// 死洼地合并后的上一级洼地
    FromExit,
}

impl PondSeed {
    /// 种类
    pub fn kind(&self) -> PondKind {
        match self {
            Self::Point(_) => PondKind::LowPoint,
            Self::Edge(..) => PondKind::Edge,
            Self::Triangle(..) => PondKind::Triangle,
            Self::Exit { .. } => PondKind::FromExit,
        }
    }

    /// 代表低点（记忆化键）
    pub fn low_point(&self) -> u32 {
        match *self {
            Self::Point(p) | Self::Edge(p, _) | Self::Triangle(p, _, _) => p,
            Self::Exit { exit_point, .. } => exit_point,
        }
    }
}

/// 边界扩展方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExpandMode {
    /// 移除不高于水位且不是出口的点
    RemoveAtElevation,
    /// 只沿等于水位的平坡扩展
    RemoveZSlope,
}

/// 洼地边界集
#[derive(Debug, Clone)]
pub struct PondAnalysis {
    seed: PondSeed,
    low_point: u32,
    low_z: f64,
    /// 体积起算面：普通洼地为低点高程，合并洼地为出口高程
    floor_z: f64,
    start_z: f64,

    current_z: f64,
    current_volume: f64,
    current_area: f64,
    rings: Vec<BoundaryRing>,
    seeded: bool,

    exits: Vec<PondExitInfo>,
    exit_z: Option<f64>,
    capacity: Option<f64>,
    low_points: Vec<u32>,

    bracket: Option<RefineBracket>,
    fill_z: Option<f64>,
    fill_volume: f64,
    expansions: Vec<f64>,
}

impl PondAnalysis {
    /// 创建洼地（尚未构建边界环）
    pub fn new<M: TinAccess + ?Sized>(tin: &M, seed: PondSeed) -> DrainageResult<Self> {
        let n = tin.n_points();
        let check = |p: u32| {
            if (p as usize) < n {
                Ok(())
            } else {
                Err(DrainageError::Tin(td_tin::TinError::point_out_of_range(p, n)))
            }
        };
        let (low_z, floor_z, start_z) = match seed {
            PondSeed::Point(p) => {
                check(p)?;
                (tin.z(p), tin.z(p), tin.z(p))
            }
            PondSeed::Edge(a, b) => {
                check(a)?;
                check(b)?;
                (tin.z(a), tin.z(a), tin.z(a))
            }
            PondSeed::Triangle(a, b, c) => {
                check(a)?;
                check(b)?;
                check(c)?;
                (tin.z(a), tin.z(a), tin.z(a))
            }
            PondSeed::Exit { exit_point, bottom_z } => {
                check(exit_point)?;
                let z = tin.z(exit_point);
                (bottom_z.min(z), z, z)
            }
        };
        Ok(Self {
            seed,
            low_point: seed.low_point(),
            low_z,
            floor_z,
            start_z,
            current_z: start_z,
            current_volume: 0.0,
            current_area: 0.0,
            rings: Vec::new(),
            seeded: false,
            exits: Vec::new(),
            exit_z: None,
            capacity: None,
            low_points: Vec::new(),
            bracket: None,
            fill_z: None,
            fill_volume: 0.0,
            expansions: Vec::new(),
        })
    }

    // ===== 查询 =====

    /// 种子
    #[inline]
    pub fn seed(&self) -> PondSeed {
        self.seed
    }

    /// 种类
    #[inline]
    pub fn kind(&self) -> PondKind {
        self.seed.kind()
    }

    /// 低点
    #[inline]
    pub fn low_point(&self) -> u32 {
        self.low_point
    }

    /// 底部高程
    #[inline]
    pub fn low_z(&self) -> f64 {
        self.low_z
    }

    /// 当前水位
    #[inline]
    pub fn current_z(&self) -> f64 {
        self.current_z
    }

    /// 完全淹没部分的面积
    #[inline]
    pub fn current_area(&self) -> f64 {
        self.current_area
    }

    /// 边界环
    #[inline]
    pub fn rings(&self) -> &[BoundaryRing] {
        &self.rings
    }

    /// 外环
    pub fn outer_ring(&self) -> Option<&BoundaryRing> {
        self.rings.iter().find(|r| r.location == RingLocation::Outer)
    }

    /// 出口（洼地求解到溢出后有效）
    #[inline]
    pub fn exits(&self) -> &[PondExitInfo] {
        &self.exits
    }

    /// 出口高程
    #[inline]
    pub fn exit_z(&self) -> Option<f64> {
        self.exit_z
    }

    /// 满蓄容量
    #[inline]
    pub fn capacity(&self) -> Option<f64> {
        self.capacity
    }

    /// 深度：出口高程与底部高程之差
    pub fn depth(&self) -> f64 {
        self.exit_z.map_or(0.0, |z| (z - self.low_z).abs())
    }

    /// 种子与扩展过程中登记的低点（高程等于底部高程）
    #[inline]
    pub fn low_points(&self) -> &[u32] {
        &self.low_points
    }

    /// 部分充水的水位
    #[inline]
    pub fn fill_z(&self) -> Option<f64> {
        self.fill_z
    }

    /// 部分充水的体积
    #[inline]
    pub fn fill_volume(&self) -> f64 {
        self.fill_volume
    }

    /// 当前求解区间
    #[inline]
    pub fn bracket(&self) -> Option<RefineBracket> {
        self.bracket
    }

    /// 扩展调用过的水位序列
    #[inline]
    pub fn expansion_elevations(&self) -> &[f64] {
        &self.expansions
    }

    /// 边界环是否已构建
    #[inline]
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// 顶点是否在任一边界环上
    pub fn on_any_ring(&self, p: u32) -> bool {
        self.rings.iter().any(|r| r.contains(p))
    }

    /// 外环是否已找到出口
    ///
    /// 岛环上的出口只冻结该岛环，水位继续上升。
    pub fn at_exit(&self) -> bool {
        match self.outer_ring() {
            Some(outer) => outer.finished,
            None => self.rings.iter().any(|r| r.finished),
        }
    }

    /// 外环上的出口；没有外环时取所有已结束环上的出口
    pub(crate) fn outer_exits(&self) -> Vec<PondExitInfo> {
        match self.outer_ring() {
            Some(outer) => outer.exits.clone(),
            None => self.rings.iter().flat_map(|r| r.exits.iter().copied()).collect(),
        }
    }

    /// 丢弃边界环，回到未构建状态（容量与出口保留）
    pub fn clear(&mut self) {
        self.rings.clear();
        self.seeded = false;
        self.current_z = self.start_z;
        self.current_volume = 0.0;
        self.current_area = 0.0;
        self.bracket = None;
        self.expansions.clear();
    }

    fn register_low_point(&mut self, p: u32) {
        if !self.low_points.contains(&p) {
            self.low_points.push(p);
        }
    }
}

#[cfg(test)]
mod tests;
