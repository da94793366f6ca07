// crates/td_drainage/src/pond/seed.rs

//! 初始边界环
//!
//! 所有种子统一为"区域 → 边界回路"：种子区域是一组已淹没的顶点
//! （低点、平边两端、平三角形三点，或出口高程以下与出口连通的全部顶点），
//! 边界环是与区域相邻但不属于区域的顶点构成的回路。
//!
//! 回路用枢轴行走求得：站在区域内的枢轴点上，绕它顺时针转到下一个邻点，
//! 邻点在区域内则枢轴移过去，否则记入回路。行走得到的回路区域在右侧，
//! 反转后水面在左侧。

use std::collections::{HashSet, VecDeque};

use td_geo::volume::triangle_area;
use td_tin::TinAccess;
use tracing::debug;

use super::{PondAnalysis, PondSeed};
use crate::error::{DrainageError, DrainageResult};
use crate::ring::{BoundaryRing, RingLocation};

impl PondAnalysis {
    /// 构建初始边界环并计入区域内部三角形
    pub fn create_initial_rings<M: TinAccess + ?Sized>(&mut self, tin: &M) -> DrainageResult<()> {
        let region = self.seed_region(tin)?;
        for &p in &region {
            if tin.is_boundary(p) {
                return Err(DrainageError::empty_seed(p, "种子点位于边界"));
            }
        }
        let inside: HashSet<u32> = region.iter().copied().collect();

        let loops = region_loops(tin, &region, &inside)?;
        if loops.is_empty() {
            return Err(DrainageError::empty_seed(self.low_point, "种子区域没有边界"));
        }
        self.rings = loops
            .into_iter()
            .map(|mut points| {
                points.reverse();
                BoundaryRing::new(points, RingLocation::Unknown)
            })
            .collect();
        self.find_outer(tin);

        self.current_z = self.start_z;
        self.current_volume = 0.0;
        self.current_area = 0.0;
        for &v in &region {
            let ring = tin.neighbours(v);
            for (k, &a) in ring.iter().enumerate() {
                let b = ring[(k + 1) % ring.len()];
                if v > a || v > b || !inside.contains(&a) || !inside.contains(&b) {
                    continue;
                }
                if tin.ant_triangle(v, a) != Some(b) {
                    continue;
                }
                let (pv, pa, pb) = (tin.point(v), tin.point(a), tin.point(b));
                self.current_area += triangle_area(&pv.xy(), &pa.xy(), &pb.xy());
                self.current_volume += self.fill_above_floor(tin, v, a, b, self.start_z);
            }
        }

        match self.seed {
            PondSeed::Exit { exit_point, .. } => self.register_low_point(exit_point),
            _ => {
                for &p in &region {
                    if tin.z(p) == self.low_z {
                        self.register_low_point(p);
                    }
                }
            }
        }
        self.seeded = true;

        debug!(
            low_point = self.low_point,
            kind = ?self.kind(),
            rings = self.rings.len(),
            region = region.len(),
            z = self.start_z,
            "洼地初始边界构建完成"
        );
        Ok(())
    }

    fn seed_region<M: TinAccess + ?Sized>(&self, tin: &M) -> DrainageResult<Vec<u32>> {
        match self.seed {
            PondSeed::Point(p) => Ok(vec![p]),
            PondSeed::Edge(a, b) => {
                if !tin.is_neighbour(a, b) {
                    return Err(DrainageError::not_neighbours("seed_edge", a, b));
                }
                Ok(vec![a, b])
            }
            PondSeed::Triangle(a, b, c) => {
                let exists = tin.ant_triangle(a, b) == Some(c) || tin.ant_triangle(b, a) == Some(c);
                if !exists {
                    return Err(DrainageError::topology(
                        "seed_triangle",
                        format!("三角形 [{a}, {b}, {c}] 不存在"),
                    ));
                }
                Ok(vec![a, b, c])
            }
            PondSeed::Exit { exit_point, .. } => {
                if tin.is_boundary(exit_point) {
                    return Err(DrainageError::empty_seed(exit_point, "出口位于边界"));
                }
                Ok(flood_region(tin, exit_point, tin.z(exit_point)))
            }
        }
    }
}

/// 与 `start` 连通、高程不超过 `level` 的非边界顶点
pub(crate) fn flood_region<M: TinAccess + ?Sized>(tin: &M, start: u32, level: f64) -> Vec<u32> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    let mut out = Vec::new();
    seen.insert(start);
    queue.push_back(start);
    while let Some(p) = queue.pop_front() {
        out.push(p);
        for &q in tin.neighbours(p) {
            if tin.z(q) <= level && !tin.is_boundary(q) && seen.insert(q) {
                queue.push_back(q);
            }
        }
    }
    out.sort_unstable();
    out
}

/// 区域的全部边界回路（区域在回路右侧）
fn region_loops<M: TinAccess + ?Sized>(
    tin: &M,
    region: &[u32],
    inside: &HashSet<u32>,
) -> DrainageResult<Vec<Vec<u32>>> {
    let mut visited: HashSet<(u32, u32)> = HashSet::new();
    let mut loops = Vec::new();
    let limit = 2 * tin.n_points() * 8 + 16;

    let mut sorted = region.to_vec();
    sorted.sort_unstable();
    for &r in &sorted {
        for &q in tin.neighbours(r) {
            if inside.contains(&q) || visited.contains(&(r, q)) {
                continue;
            }
            visited.insert((r, q));
            let mut points = vec![q];
            let (mut rot, mut sp) = (r, q);
            let mut steps = 0;
            loop {
                let np = tin
                    .next_clk(rot, sp)
                    .ok_or_else(|| DrainageError::not_neighbours("region_loops", rot, sp))?;
                let pivot = inside.contains(&np);
                if pivot {
                    rot = np;
                } else {
                    sp = np;
                }
                if rot == r && sp == q {
                    break;
                }
                visited.insert((rot, sp));
                if !pivot {
                    points.push(np);
                }
                steps += 1;
                if steps > limit {
                    return Err(DrainageError::topology("region_loops", "边界回路不闭合"));
                }
            }
            loops.push(points);
        }
    }
    Ok(loops)
}
