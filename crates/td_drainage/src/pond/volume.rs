// crates/td_drainage/src/pond/volume.rs

//! 洼地体积与充水求解
//!
//! 满蓄求解：边界环逐级抬升，直到外环出现出口，出口高程处的体积即容量。
//! 岛环上出现的出口只让该岛环停止扩展。
//!
//! 部分充水：抬升过程中一旦下一级高程处的体积超过目标，记下区间
//! `[current_z, next_z]`，在区间内先按比例插值一步，再二分求出水位。
//! 区间内边界环不变，体积函数单调连续。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use td_geo::volume::prism_to_plane;
use td_tin::TinAccess;
use tracing::{debug, trace};

use super::{ExpandMode, PondAnalysis};
use crate::config::TraceConfig;
use crate::error::{DrainageError, DrainageResult};

/// 充水求解区间
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefineBracket {
    /// 下限高程
    pub low_z: f64,
    /// 上限高程
    pub high_z: f64,
    /// 下限体积
    pub low_volume: f64,
    /// 上限体积
    pub high_volume: f64,
}

impl PondAnalysis {
    /// 求满蓄边界：扩展到出口，记录出口高程、容量与出口列表
    pub fn find_pond<M: TinAccess + ?Sized>(&mut self, tin: &M) -> DrainageResult<()> {
        self.find_boundary_for_volume(tin, None).map(|_| ())
    }

    /// 扩展边界直到找到出口，或直到下一级高程的体积超过 `target`
    ///
    /// 返回 `true` 表示目标体积落在求解区间内（洼地不会满），
    /// 返回 `false` 表示到达出口。
    pub fn find_boundary_for_volume<M: TinAccess + ?Sized>(
        &mut self,
        tin: &M,
        target: Option<f64>,
    ) -> DrainageResult<bool> {
        if let Some(t) = target {
            if self.seeded && (self.at_exit() || t < self.volume_at(tin, self.current_z)) {
                self.clear();
            }
        }
        if !self.seeded {
            self.create_initial_rings(tin)?;
            self.get_exit_points(tin, self.current_z)?;
        }

        loop {
            if self.at_exit() {
                self.exit_z = Some(self.current_z);
                break;
            }
            let z = self.current_z;
            self.expand_rings(tin, ExpandMode::RemoveAtElevation, z)?;
            let next = self.lowest_above(tin, z).ok_or(DrainageError::ExitNotFound {
                low_point: self.low_point,
            })?;
            if next <= z {
                return Err(DrainageError::Stuck { elevation: z });
            }
            if let Some(t) = target {
                let high_volume = self.volume_at(tin, next);
                if high_volume > t {
                    self.bracket = Some(RefineBracket {
                        low_z: z,
                        high_z: next,
                        low_volume: self.volume_at(tin, z),
                        high_volume,
                    });
                    return Ok(true);
                }
            }
            self.raise_to(next);
            self.get_exit_points(tin, next)?;
        }

        self.capacity = Some(self.volume_at(tin, self.current_z));
        self.exits = self.outer_exits();
        debug!(
            low_point = self.low_point,
            exit_z = self.current_z,
            capacity = self.capacity,
            exits = self.exits.len(),
            "洼地满蓄求解完成"
        );
        Ok(false)
    }

    /// 在求解区间内求出蓄水 `target` 时的水位
    pub fn refine_target_elevation<M: TinAccess + ?Sized>(
        &mut self,
        tin: &M,
        config: &TraceConfig,
        target: f64,
    ) -> DrainageResult<f64> {
        let bracket = match self.bracket {
            Some(b) if b.low_z == self.current_z => b,
            _ => {
                if !self.find_boundary_for_volume(tin, Some(target))? {
                    return Ok(self.fill_full());
                }
                self.bracket.ok_or(DrainageError::ExitNotFound {
                    low_point: self.low_point,
                })?
            }
        };
        let RefineBracket {
            low_z: mut lo,
            high_z: mut hi,
            low_volume: mut v_lo,
            high_volume: mut v_hi,
        } = bracket;
        if hi <= lo || v_hi <= v_lo {
            return Err(DrainageError::DegenerateBracket {
                low: lo,
                high: hi,
                low_volume: v_lo,
                high_volume: v_hi,
            });
        }

        // 首步按比例插值，之后二分
        let mut z = lo + (hi - lo) * ((target - v_lo) / (v_hi - v_lo)).clamp(0.0, 1.0);
        let mut iterations = 0;
        while iterations < config.max_refine_iterations {
            iterations += 1;
            let v = self.volume_at(tin, z);
            if (v - target).abs() < config.volume_tolerance {
                break;
            }
            if v < target {
                lo = z;
                v_lo = v;
            } else {
                hi = z;
                v_hi = v;
            }
            if hi - lo < config.elevation_tolerance {
                break;
            }
            z = 0.5 * (lo + hi);
        }
        trace!(low_point = self.low_point, iterations, z, v_lo, v_hi, "水位求解收敛");

        self.fill_z = Some(z);
        self.fill_volume = target;
        Ok(z)
    }

    /// 按蓄水量求水位；体积不小于容量时为出口高程
    ///
    /// 体积不为正时返回 `None`。
    pub fn fill_to_volume<M: TinAccess + ?Sized>(
        &mut self,
        tin: &M,
        config: &TraceConfig,
        volume: f64,
    ) -> DrainageResult<Option<f64>> {
        if !(volume > 0.0) {
            self.fill_z = None;
            self.fill_volume = 0.0;
            return Ok(None);
        }
        if self.find_boundary_for_volume(tin, Some(volume))? {
            self.refine_target_elevation(tin, config, volume).map(Some)
        } else {
            Ok(Some(self.fill_full()))
        }
    }

    /// 当前边界下水位 `z` 处的蓄水量
    ///
    /// 在 `current_z` 与下一个环上高程之间精确。
    pub fn volume_at<M: TinAccess + ?Sized>(&self, tin: &M, z: f64) -> f64 {
        self.current_volume + self.current_area * (z - self.current_z) + self.side_volume(tin, z)
    }

    /// 注满：边界环停在部分充水的位置时先扩展回出口
    pub fn fill_to_capacity<M: TinAccess + ?Sized>(&mut self, tin: &M) -> DrainageResult<f64> {
        if !self.seeded || !self.at_exit() {
            self.find_boundary_for_volume(tin, None)?;
        }
        Ok(self.fill_full())
    }

    pub(crate) fn fill_full(&mut self) -> f64 {
        let z = self.exit_z.unwrap_or(self.current_z);
        self.fill_z = Some(z);
        self.fill_volume = self.capacity.unwrap_or(0.0);
        self.bracket = None;
        z
    }

    /// 环上顶点湿侧扇区三角形在 `z` 处的蓄水量（每个三角形只计一次）
    fn side_volume<M: TinAccess + ?Sized>(&self, tin: &M, z: f64) -> f64 {
        let mut seen: HashSet<[u32; 3]> = HashSet::new();
        let mut total = 0.0;
        for ring in &self.rings {
            for i in 0..ring.len() {
                let v = ring.at(i);
                let prev = ring.at(ring.prev_index(i));
                let next = ring.at(ring.next_index(i));
                for (a, b) in fan_triangles(tin, v, prev, next) {
                    let mut key = [v, a, b];
                    key.sort_unstable();
                    if seen.insert(key) {
                        total += self.fill_above_floor(tin, v, a, b, z);
                    }
                }
            }
        }
        total
    }

    /// 三角形在 `z` 处高于体积起算面的蓄水量
    pub(crate) fn fill_above_floor<M: TinAccess + ?Sized>(
        &self,
        tin: &M,
        a: u32,
        b: u32,
        c: u32,
        z: f64,
    ) -> f64 {
        let (pa, pb, pc) = (tin.point(a), tin.point(b), tin.point(c));
        let fill = prism_to_plane(&pa, &pb, &pc, z).fill_volume;
        if pa.z.min(pb.z).min(pc.z) < self.floor_z {
            fill - prism_to_plane(&pa, &pb, &pc, self.floor_z).fill_volume
        } else {
            fill
        }
    }
}

/// 环上顶点 `v` 湿侧的三角形 `(v, a, b)`（逆时针）
///
/// 湿侧为绕 `v` 从 `prev` 顺时针到 `next`；`prev == next` 或 `prev` 不是邻点（1 点环）时为整圈。
pub(crate) fn fan_triangles<M: TinAccess + ?Sized>(tin: &M, v: u32, prev: u32, next: u32) -> Vec<(u32, u32)> {
    let ring = tin.neighbours(v);
    let n = ring.len();
    let mut out = Vec::new();
    let full = prev == next || !ring.contains(&prev);
    if full {
        for k in 0..n {
            let (a, b) = (ring[k], ring[(k + 1) % n]);
            if tin.ant_triangle(v, a) == Some(b) {
                out.push((a, b));
            }
        }
        return out;
    }
    let mut x = prev;
    for _ in 0..n {
        let Some(y) = tin.next_clk(v, x) else { break };
        if tin.ant_triangle(v, y) == Some(x) {
            out.push((y, x));
        }
        if y == next {
            break;
        }
        x = y;
    }
    out
}
