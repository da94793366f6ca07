// crates/td_drainage/src/analysis/trace.rs

//! 追踪特征的处理：起点、三角形内、边上、顶点
//!
//! 路径 `path` 从特征的入口位置开始，到子特征的入口位置结束，
//! 因此相邻特征的路径首尾相接。

use td_geo::intersect::{ray_segment, side_of};
use td_geo::{EdgeFlow, Point3D};
use td_tin::{Located, TinAccess};

use super::WaterAnalysis;
use crate::config::ZeroSlopeOption;
use crate::descent::{hydrology, steepest_descent, Descent};
use crate::error::{DrainageError, DrainageResult};
use crate::feature::{FeatureId, FeatureKind};
use crate::pond::PondSeed;

/// 射线离开三角形的位置
#[derive(Debug, Clone, Copy)]
pub(crate) enum Crossing {
    /// 穿过顶点（容差内）
    Vertex(u32),
    /// 穿过边内部
    Edge(Point3D),
}

impl<'a, M: TinAccess + ?Sized> WaterAnalysis<'a, M> {
    // ===== 起点 =====

    pub(super) fn process_start(&mut self, id: FeatureId) -> DrainageResult<()> {
        let FeatureKind::StartPoint { at } = self.features[id].kind else {
            return Ok(());
        };
        self.features[id].finished = true;

        match self.locator.locate(&self.surface, at.x, at.y) {
            Located::OffMesh => Err(DrainageError::OffMesh { x: at.x, y: at.y }),
            Located::Void => Err(DrainageError::VoidStart { x: at.x, y: at.y }),
            Located::Point { point, .. } => {
                self.on_point(id, point, None)?;
                Ok(())
            }
            Located::Edge { p1, p2, at } => self.start_on_edge(id, p1, p2, at),
            Located::Triangle { p1, p2, p3, at } => {
                let h = hydrology(&self.surface, self.tables, p1, p2, p3)?;
                if h.is_flat() {
                    return match self.config.zero_slope {
                        ZeroSlopeOption::Pond => self.pond_or_boundary(id, PondSeed::Triangle(p1, p2, p3)),
                        ZeroSlopeOption::TraceLastAngle => Err(DrainageError::NoLastAngle),
                    };
                }
                self.add_child(id, FeatureKind::InTriangle { p1, p2, p3, at })?;
                Ok(())
            }
        }
    }

    /// 起点在边上：向每个对顶点更低的一侧各追踪一条
    fn start_on_edge(&mut self, id: FeatureId, p1: u32, p2: u32, at: Point3D) -> DrainageResult<()> {
        let right = self.surface.ant_triangle(p1, p2);
        let left = self.surface.ant_triangle(p2, p1);
        let mut sides = Vec::with_capacity(2);
        if let Some(r) = right.filter(|&r| self.surface.z(r) < at.z) {
            sides.push((p1, p2, r));
        }
        if let Some(s) = left.filter(|&s| self.surface.z(s) < at.z) {
            sides.push((p2, p1, s));
        }
        if sides.is_empty() {
            self.add_child(
                id,
                FeatureKind::OnEdge {
                    p1,
                    p2,
                    p3: right,
                    at,
                    last_angle: None,
                },
            )?;
            return Ok(());
        }
        for (a, b, c) in sides {
            self.add_child(
                id,
                FeatureKind::OnEdge {
                    p1: a,
                    p2: b,
                    p3: Some(c),
                    at,
                    last_angle: None,
                },
            )?;
        }
        Ok(())
    }

    // ===== 三角形内 =====

    pub(super) fn process_in_triangle(&mut self, id: FeatureId) -> DrainageResult<()> {
        let FeatureKind::InTriangle { p1, p2, p3, at } = self.features[id].kind else {
            return Ok(());
        };
        self.features[id].finished = true;
        self.features[id].path.push(at);

        let h = hydrology(&self.surface, self.tables, p1, p2, p3)?;
        if h.is_flat() {
            return match self.config.zero_slope {
                ZeroSlopeOption::Pond => self.pond_or_boundary(id, PondSeed::Triangle(p1, p2, p3)),
                ZeroSlopeOption::TraceLastAngle => Err(DrainageError::NoLastAngle),
            };
        }
        let angle = h.descent_angle;

        // 起点在三角形内部，离开的边是最远的交点
        let mut best: Option<(f64, u32, u32)> = None;
        for (a, b) in [(p1, p2), (p2, p3), (p3, p1)] {
            let (pa, pb) = (self.surface.point(a), self.surface.point(b));
            if let Ok(hit) = ray_segment(&at.xy(), angle, &pa, &pb, self.surface.tolerance().line) {
                let d = hit.point.distance_2d(&at);
                if best.map_or(true, |(bd, _, _)| d > bd) {
                    best = Some((d, a, b));
                }
            }
        }
        let (_, a, b) = best.ok_or_else(|| {
            DrainageError::topology("trace_in_triangle", format!("射线未离开三角形 [{p1}, {p2}, {p3}]"))
        })?;
        let crossing = self.cross_edge(at, angle, a, b)?;
        self.follow_crossing(id, a, b, crossing, Some(angle))?;
        Ok(())
    }

    // ===== 边上 =====

    /// 沿边行走：逐个穿过三角形，直到到达顶点、洼地或离开网格
    pub(super) fn process_on_edge(&mut self, id: FeatureId) -> DrainageResult<()> {
        let FeatureKind::OnEdge {
            mut p1,
            mut p2,
            mut p3,
            mut at,
            mut last_angle,
        } = self.features[id].kind
        else {
            return Ok(());
        };
        self.features[id].finished = true;
        self.features[id].path.push(at);

        let limit = 4 * self.surface.n_triangles() + 16;
        for _ in 0..limit {
            // 边外侧没有三角形：离开网格
            let Some(apex) = p3 else {
                return Ok(());
            };
            let h = hydrology(&self.surface, self.tables, p1, p2, apex)?;

            let angle = if h.is_flat() {
                match (self.config.zero_slope, last_angle) {
                    (ZeroSlopeOption::Pond, _) => {
                        return self.pond_or_boundary(id, PondSeed::Triangle(p1, p2, apex));
                    }
                    (ZeroSlopeOption::TraceLastAngle, Some(angle)) => angle,
                    (ZeroSlopeOption::TraceLastAngle, None) => return Err(DrainageError::NoLastAngle),
                }
            } else {
                match h.edge_flow[0] {
                    EdgeFlow::Away => h.descent_angle,
                    flow => {
                        // 两侧都汇向此边：沿边流向较低端点
                        let (z1, z2) = (self.surface.z(p1), self.surface.z(p2));
                        let low = if z2 < z1 { p2 } else { p1 };
                        self.features[id].sump = flow == EdgeFlow::Toward;
                        self.features[id].path.push(self.surface.point(low));
                        self.on_point(id, low, last_angle)?;
                        return Ok(());
                    }
                }
            };
            last_angle = Some(angle);

            // 对顶点相对射线的位置决定离开的边
            let origin = at.xy();
            let ahead = origin.offset(angle, 1.0);
            let pc = self.surface.point(apex);
            let side = side_of(&origin, &ahead, &pc.xy());
            if side.abs() <= self.surface.tolerance().point {
                self.features[id].path.push(pc);
                self.on_point(id, apex, last_angle)?;
                return Ok(());
            }
            let (a, b) = if side > 0.0 { (p2, apex) } else { (apex, p1) };
            match self.cross_edge(at, angle, a, b)? {
                Crossing::Vertex(v) => {
                    self.features[id].path.push(self.surface.point(v));
                    self.on_point(id, v, last_angle)?;
                    return Ok(());
                }
                Crossing::Edge(hit) => {
                    self.features[id].path.push(hit);
                    at = hit;
                    p1 = b;
                    p2 = a;
                    p3 = self.surface.ant_triangle(b, a);
                }
            }
        }
        Err(DrainageError::topology("trace_on_edge", format!("沿边行走超过 {limit} 个三角形")))
    }

    // ===== 顶点 =====

    pub(super) fn process_on_point(&mut self, id: FeatureId) -> DrainageResult<()> {
        let FeatureKind::OnPoint { point, last_angle, .. } = self.features[id].kind else {
            return Ok(());
        };
        self.features[id].finished = true;
        let here = self.surface.point(point);
        self.features[id].path.push(here);

        let descent = steepest_descent(&self.surface, self.tables, point)?;
        if self.surface.is_boundary(point) && descent.slope() <= 0.0 {
            self.mark_on_hull(id);
            return Ok(());
        }

        match descent {
            Descent::None => self.pond_or_boundary(id, PondSeed::Point(point)),
            Descent::Edge { to, slope, .. } if slope <= 0.0 => {
                self.pond_or_boundary(id, PondSeed::Edge(point, to))
            }
            Descent::Edge { to, sump, .. } => {
                let there = self.surface.point(to);
                let angle = here.xy().angle_to(&there.xy());
                self.features[id].sump = sump;
                self.features[id].path.push(there);
                self.on_point(id, to, Some(angle))?;
                Ok(())
            }
            Descent::Triangle { a, b, slope, .. } if slope <= 0.0 => match (self.config.zero_slope, last_angle) {
                (ZeroSlopeOption::Pond, _) => self.pond_or_boundary(id, PondSeed::Triangle(point, a, b)),
                (ZeroSlopeOption::TraceLastAngle, Some(angle)) => {
                    let crossing = self.cross_edge(here, angle, a, b)?;
                    self.follow_crossing(id, a, b, crossing, Some(angle))?;
                    Ok(())
                }
                (ZeroSlopeOption::TraceLastAngle, None) => Err(DrainageError::NoLastAngle),
            },
            Descent::Triangle { a, b, angle, .. } => {
                let crossing = self.cross_edge(here, angle, a, b)?;
                self.follow_crossing(id, a, b, crossing, Some(angle))?;
                Ok(())
            }
        }
    }

    // ===== 公共步骤 =====

    /// 射线与边 `a-b` 的交点，靠近端点时吸附到顶点
    pub(crate) fn cross_edge(&self, origin: Point3D, angle: f64, a: u32, b: u32) -> DrainageResult<Crossing> {
        let tol = self.surface.tolerance();
        let (pa, pb) = (self.surface.point(a), self.surface.point(b));
        let hit = ray_segment(&origin.xy(), angle, &pa, &pb, tol.line)?;
        if hit.point.distance_2d(&pa) <= tol.point {
            return Ok(Crossing::Vertex(a));
        }
        if hit.point.distance_2d(&pb) <= tol.point {
            return Ok(Crossing::Vertex(b));
        }
        Ok(Crossing::Edge(hit.point))
    }

    /// 按交点生成下游特征；`a → b` 是被穿过三角形的逆时针边
    pub(crate) fn follow_crossing(
        &mut self,
        id: FeatureId,
        a: u32,
        b: u32,
        crossing: Crossing,
        last_angle: Option<f64>,
    ) -> DrainageResult<FeatureId> {
        match crossing {
            Crossing::Vertex(v) => {
                self.features[id].path.push(self.surface.point(v));
                self.on_point(id, v, last_angle)
            }
            Crossing::Edge(at) => {
                self.features[id].path.push(at);
                let p3 = self.surface.ant_triangle(b, a);
                self.add_child(
                    id,
                    FeatureKind::OnEdge {
                        p1: b,
                        p2: a,
                        p3,
                        at,
                        last_angle,
                    },
                )
            }
        }
    }

    /// 在种子处生成洼地；种子碰到边界时水流从边界点离开
    pub(crate) fn pond_or_boundary(&mut self, id: FeatureId, seed: PondSeed) -> DrainageResult<()> {
        let points = match seed {
            PondSeed::Point(p) => vec![p],
            PondSeed::Edge(a, b) => vec![a, b],
            PondSeed::Triangle(a, b, c) => vec![a, b, c],
            PondSeed::Exit { exit_point, .. } => vec![exit_point],
        };
        if let Some(&b) = points.iter().find(|&&p| self.surface.is_boundary(p)) {
            let here = match self.features[id].kind {
                FeatureKind::OnPoint { point, .. } => Some(point),
                _ => None,
            };
            if here == Some(b) {
                self.mark_on_hull(id);
            } else {
                self.features[id].path.push(self.surface.point(b));
                self.on_point(id, b, None)?;
            }
            return Ok(());
        }
        self.pond_feature(id, seed)?;
        Ok(())
    }

    fn mark_on_hull(&mut self, id: FeatureId) {
        if let FeatureKind::OnPoint { on_hull, .. } = &mut self.features[id].kind {
            *on_hull = true;
        }
    }
}

