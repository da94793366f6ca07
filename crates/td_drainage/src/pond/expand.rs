// crates/td_drainage/src/pond/expand.rs

//! 边界环扩展与出口检测
//!
//! 扫描环上每条边 `sp → np`，判断 `np` 是否应被淹没：
//!
//! - 淹没 `np` 的方式是把边外侧三角形 `(sp, outer, np)` 并入水面，
//!   即在 `sp` 与 `np` 之间插入 `outer`
//! - `np` 的外侧扇区被完全吞掉后（`outer` 恰为 `np` 的后继），`np` 从环上移除，
//!   它周围完全淹没的三角形计入体积
//! - 插入的 `outer` 已在环上时，环在该点自相接触，立即拆成两条
//!
//! 同一高程下反复扫描直到一整圈没有变化。

use td_geo::volume::triangle_area;
use td_tin::TinAccess;
use tracing::{debug, trace};

use super::{ExpandMode, PondAnalysis};
use crate::error::{DrainageError, DrainageResult};
use crate::ring::{BoundaryRing, PondExitInfo, RingLocation};

/// 环上顶点相对水面的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PointClass {
    /// 外侧全部更高
    Interior,
    /// 外侧有等高点，没有更低点
    Sump,
    /// 外侧有更低点，或位于边界
    Exit,
}

/// 环上顶点 `p`（前驱 `prev`、后继 `next`）的外侧分类
///
/// 外侧扇区为绕 `p` 从 `prev` 逆时针到 `next` 之间的邻点。
pub(crate) fn classify_point<M: TinAccess + ?Sized>(
    tin: &M,
    prev: u32,
    p: u32,
    next: u32,
) -> DrainageResult<PointClass> {
    if tin.is_boundary(p) {
        return Ok(PointClass::Exit);
    }
    let ring = tin.neighbours(p);
    let n = ring.len();
    // 1 点环：外侧为整个邻点环
    let sector: Vec<u32> = if prev == p {
        ring.to_vec()
    } else {
        let start = ring
            .iter()
            .position(|&v| v == prev)
            .ok_or_else(|| DrainageError::not_neighbours("classify_point", p, prev))?;
        if prev != next && !ring.contains(&next) {
            return Err(DrainageError::not_neighbours("classify_point", p, next));
        }
        (1..n)
            .map(|k| ring[(start + k) % n])
            .take_while(|&q| q != next)
            .collect()
    };
    let zp = tin.z(p);
    let mut sump = false;
    for q in sector {
        let zq = tin.z(q);
        if zq < zp {
            return Ok(PointClass::Exit);
        }
        if zq == zp {
            sump = true;
        }
    }
    Ok(if sump { PointClass::Sump } else { PointClass::Interior })
}

/// 边 `sp → np` 外侧三角形 `(sp, outer, np)` 的顶点
pub(crate) fn outer_apex<M: TinAccess + ?Sized>(tin: &M, sp: u32, np: u32) -> Option<u32> {
    let outer = tin.next_clk(sp, np)?;
    (tin.ant_triangle(sp, outer) == Some(np)).then_some(outer)
}

/// 单次修改后的扫描位置
enum Step {
    Resume(usize),
    Split,
}

impl PondAnalysis {
    /// 把水位升到 `z` 并扩展边界环
    ///
    /// 依次经过 `z` 以下的每个环上高程，平坡扩展、淹没扩展各做一遍。
    /// 已找到出口的环不再扩展。在同一高程重复调用不会改变边界。
    pub fn expand_to_elevation<M: TinAccess + ?Sized>(&mut self, tin: &M, z: f64) -> DrainageResult<()> {
        if !self.seeded {
            self.create_initial_rings(tin)?;
        }
        if z < self.current_z {
            return Err(DrainageError::ElevationBelowCurrent {
                current: self.current_z,
                requested: z,
            });
        }
        while let Some(next) = self.lowest_above(tin, self.current_z) {
            if next > z {
                break;
            }
            self.raise_to(next);
            self.expand_rings(tin, ExpandMode::RemoveZSlope, next)?;
            self.expand_rings(tin, ExpandMode::RemoveAtElevation, next)?;
        }
        self.raise_to(z);
        self.expand_rings(tin, ExpandMode::RemoveAtElevation, z)
    }

    /// 在 `z` 处平坡扩展后扫描出口，返回是否找到
    pub fn get_exit_points<M: TinAccess + ?Sized>(&mut self, tin: &M, z: f64) -> DrainageResult<bool> {
        self.expand_rings(tin, ExpandMode::RemoveZSlope, z)?;

        let mut found = false;
        for ring in &mut self.rings {
            if ring.finished || ring.is_empty() {
                continue;
            }
            let mut exits: Vec<PondExitInfo> = Vec::new();
            for i in 0..ring.len() {
                let j = ring.next_index(i);
                let (sp, np) = (ring.at(i), ring.at(j));
                let zn = tin.z(np);
                if zn > z || exits.iter().any(|e| e.exit_point == np) {
                    continue;
                }
                let nn = ring.at(ring.next_index(j));
                let exit = if zn < z || tin.is_boundary(np) {
                    true
                } else {
                    match classify_point(tin, sp, np, nn)? {
                        PointClass::Exit => true,
                        PointClass::Sump => {
                            i != j && outer_apex(tin, sp, np).map_or(false, |o| tin.z(o) != z)
                        }
                        PointClass::Interior => false,
                    }
                };
                if exit {
                    exits.push(PondExitInfo {
                        exit_point: np,
                        prior: sp,
                        next: nn,
                    });
                }
            }
            if !exits.is_empty() {
                ring.exits = exits;
                ring.finished = true;
                found = true;
            }
        }

        if found {
            debug!(
                low_point = self.low_point,
                z,
                exits = self.rings.iter().map(|r| r.exits.len()).sum::<usize>(),
                "洼地找到出口"
            );
        }
        Ok(found)
    }

    /// 未结束环上高于 `z` 的最低高程
    pub(crate) fn lowest_above<M: TinAccess + ?Sized>(&self, tin: &M, z: f64) -> Option<f64> {
        self.rings
            .iter()
            .filter(|r| !r.finished)
            .flat_map(|r| r.points().iter())
            .map(|&p| tin.z(p))
            .filter(|&pz| pz > z)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// 水位抬升到 `z`，完全淹没部分按面积累计
    pub(crate) fn raise_to(&mut self, z: f64) {
        if z > self.current_z {
            self.current_volume += self.current_area * (z - self.current_z);
            self.current_z = z;
        }
    }

    /// 扩展全部未结束的环直到稳定
    pub(crate) fn expand_rings<M: TinAccess + ?Sized>(
        &mut self,
        tin: &M,
        mode: ExpandMode,
        z: f64,
    ) -> DrainageResult<()> {
        match self.expansions.last() {
            Some(&last) if z < last => {
                return Err(DrainageError::ElevationBelowCurrent {
                    current: last,
                    requested: z,
                })
            }
            Some(&last) if z == last => {}
            _ => self.expansions.push(z),
        }

        let mut split = false;
        let mut r = 0;
        while r < self.rings.len() {
            if !self.rings[r].finished && !self.rings[r].is_empty() {
                split |= self.expand_ring(tin, r, mode, z)?;
            }
            r += 1;
        }

        let before = self.rings.len();
        self.rings.retain(|ring| !ring.is_empty());
        let has_outer = self.rings.iter().any(|r| r.location == RingLocation::Outer);
        if split || before != self.rings.len() || !has_outer {
            self.find_outer(tin);
        }
        Ok(())
    }

    /// 把外环判定给非岛环中唯一逆时针的一条，否则给含最小顶点编号的一条
    pub(crate) fn find_outer<M: TinAccess + ?Sized>(&mut self, tin: &M) {
        let candidates: Vec<usize> = (0..self.rings.len())
            .filter(|&r| self.rings[r].location != RingLocation::Inner && !self.rings[r].is_empty())
            .collect();
        let outer = match candidates.as_slice() {
            [] => return,
            [only] => *only,
            _ => {
                let ccw: Vec<usize> = candidates
                    .iter()
                    .copied()
                    .filter(|&r| self.rings[r].signed_area(tin) > 0.0)
                    .collect();
                if ccw.len() == 1 {
                    ccw[0]
                } else {
                    let mut best = candidates[0];
                    for &r in &candidates[1..] {
                        if self.rings[r].min_point() < self.rings[best].min_point() {
                            best = r;
                        }
                    }
                    best
                }
            }
        };
        for r in candidates {
            self.rings[r].location = if r == outer {
                RingLocation::Outer
            } else {
                RingLocation::Inner
            };
        }
    }

    fn expand_ring<M: TinAccess + ?Sized>(
        &mut self,
        tin: &M,
        r: usize,
        mode: ExpandMode,
        z: f64,
    ) -> DrainageResult<bool> {
        let limit = 4 * tin.n_triangles() + 16;
        let mut steps = 0;
        let mut split = false;
        let mut clean = 0;
        let mut i = 0;
        loop {
            let len = self.rings[r].len();
            if len == 0 || clean >= len {
                break;
            }
            if i >= len {
                i = 0;
            }
            let j = self.rings[r].next_index(i);
            if self.should_remove(tin, r, i, j, mode, z)? {
                steps += 1;
                if steps > limit {
                    return Err(DrainageError::topology("expand_ring", format!("水位 {z} 处扩展不收敛")));
                }
                match self.add_triangle(tin, r, i, j, z)? {
                    Step::Resume(k) => i = k,
                    Step::Split => {
                        split = true;
                        i = 0;
                    }
                }
                clean = 0;
            } else {
                i += 1;
                clean += 1;
            }
        }
        Ok(split)
    }

    fn should_remove<M: TinAccess + ?Sized>(
        &self,
        tin: &M,
        r: usize,
        i: usize,
        j: usize,
        mode: ExpandMode,
        z: f64,
    ) -> DrainageResult<bool> {
        let ring = &self.rings[r];
        let (sp, np) = (ring.at(i), ring.at(j));
        if tin.is_boundary(np) {
            return Ok(false);
        }
        let nn = ring.at(ring.next_index(j));
        let zn = tin.z(np);
        match mode {
            ExpandMode::RemoveAtElevation => {
                if zn > z {
                    Ok(false)
                } else if nn == sp {
                    Ok(true)
                } else {
                    Ok(classify_point(tin, sp, np, nn)? != PointClass::Exit)
                }
            }
            ExpandMode::RemoveZSlope => {
                if zn != z {
                    return Ok(false);
                }
                if i == j || ring.occurrences(np) > 1 {
                    return Ok(true);
                }
                let outer = outer_apex(tin, sp, np);
                let outer_flat = outer.map_or(false, |o| tin.z(o) == z);
                if tin.z(sp) == z && outer_flat {
                    return Ok(true);
                }
                if nn != sp && classify_point(tin, sp, np, nn)? == PointClass::Exit {
                    return Ok(false);
                }
                Ok(outer_flat)
            }
        }
    }

    /// 淹没边 `ring[i] → ring[j]` 外侧的三角形
    fn add_triangle<M: TinAccess + ?Sized>(
        &mut self,
        tin: &M,
        r: usize,
        i: usize,
        j: usize,
        z: f64,
    ) -> DrainageResult<Step> {
        let ring = &mut self.rings[r];
        let n = ring.len();
        let (sp, np) = (ring.at(i), ring.at(j));

        // 1 点环：孤立点被淹没
        if n == 1 {
            ring.remove(0);
            self.absorb_point(tin, np, z);
            return Ok(Step::Resume(0));
        }

        // 2 点环或尖刺 sp, np, sp
        let k = ring.next_index(j);
        if ring.at(k) == sp {
            if n == 2 {
                ring.remove(j);
            } else {
                ring.remove(j.max(k));
                ring.remove(j.min(k));
            }
            self.absorb_point(tin, np, z);
            return Ok(Step::Resume(i.saturating_sub(1)));
        }

        let outer = outer_apex(tin, sp, np).ok_or_else(|| {
            DrainageError::topology("add_triangle", format!("边 {sp}->{np} 外侧没有三角形"))
        })?;

        // np 的外侧扇区已被吞完
        if outer == ring.at(k) {
            ring.remove(j);
            self.absorb_point(tin, np, z);
            return Ok(Step::Resume(i.saturating_sub(1)));
        }

        // sp 被水面包围，成为孤岛
        if n > 3 && outer == ring.at(ring.prev_index(i)) {
            ring.remove(i);
            trace!(point = sp, "边界点成为孤岛");
            self.rings.push(BoundaryRing::new(vec![sp], RingLocation::Inner));
            return Ok(Step::Resume(i.saturating_sub(1)));
        }

        let at = ring.insert_after(i, outer);
        if ring.occurrences(outer) > 1 {
            let other = ring.find_other(outer, at).ok_or_else(|| {
                DrainageError::topology("add_triangle", format!("环上找不到重复点 {outer}"))
            })?;
            let tail = ring.split_off(at, other);
            let location = if ring.location == RingLocation::Inner {
                RingLocation::Inner
            } else {
                ring.location = RingLocation::Unknown;
                RingLocation::Unknown
            };
            let mut fresh = BoundaryRing::new(tail, location);
            fresh.exits = ring.exits.clone();
            fresh.retain_exits();
            ring.retain_exits();
            debug!(point = outer, z, "边界环分裂");
            self.rings.push(fresh);
            return Ok(Step::Split);
        }
        Ok(Step::Resume(i))
    }

    /// 顶点离开所有环后，计入它周围完全淹没的三角形
    pub(crate) fn absorb_point<M: TinAccess + ?Sized>(&mut self, tin: &M, v: u32, z: f64) {
        if self.on_any_ring(v) {
            return;
        }
        if tin.z(v) == self.low_z {
            self.register_low_point(v);
        }
        let ring = tin.neighbours(v);
        for (k, &a) in ring.iter().enumerate() {
            let b = ring[(k + 1) % ring.len()];
            if tin.ant_triangle(v, a) != Some(b) || self.on_any_ring(a) || self.on_any_ring(b) {
                continue;
            }
            let (pv, pa, pb) = (tin.point(v), tin.point(a), tin.point(b));
            self.current_area += triangle_area(&pv.xy(), &pa.xy(), &pb.xy());
            self.current_volume += self.fill_above_floor(tin, v, a, b, z);
        }
    }
}
