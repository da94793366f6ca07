// crates/td_drainage/src/descent.rs

//! 顶点处的最速下降方向
//!
//! 在顶点 `p` 的一个扇区内比较两类候选：
//!
//! - 沿边走向更低的邻点，坡度 `Δz / 水平距离`；两侧三角形都汇向该边时为汇水线
//! - 穿过相邻三角形，三角形的最速下降方向必须严格落在该三角形在 `p` 处的张角内
//!
//! 坡度最大者胜出，相等时取扫描顺序中较早者。没有正坡度时退而取平三角形、平边。

use td_geo::geometry::anticlockwise_sweep;
use td_geo::plane::triangle_hydrology;
use td_geo::{EdgeFlow, TriangleHydrology};
use td_tin::TinAccess;

use crate::error::DrainageResult;
use crate::tables::DrainageTables;

/// 最速下降结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Descent {
    /// 所有方向都更高（低点）
    None,
    /// 沿边到邻点 `to`
    Edge {
        /// 目标邻点
        to: u32,
        /// 坡度（平边为 0）
        slope: f64,
        /// 两侧三角形都汇向此边
        sump: bool,
    },
    /// 穿过三角形 `(p, a, b)`，将在边 `a-b` 上离开
    Triangle {
        /// 张角起始邻点
        a: u32,
        /// 张角终止邻点
        b: u32,
        /// 下降方位角
        angle: f64,
        /// 坡度（平三角形为 0）
        slope: f64,
    },
}

impl Descent {
    /// 坡度
    pub fn slope(&self) -> f64 {
        match *self {
            Self::None => 0.0,
            Self::Edge { slope, .. } | Self::Triangle { slope, .. } => slope,
        }
    }
}

/// 三角形水文属性：查找表有效时查表，否则直接计算
pub fn hydrology<M: TinAccess + ?Sized>(
    tin: &M,
    tables: Option<&DrainageTables>,
    a: u32,
    b: u32,
    c: u32,
) -> DrainageResult<TriangleHydrology> {
    if let Some(h) = tables
        .filter(|t| t.is_valid_for(tin))
        .and_then(|t| t.triangle_hydrology(a, b, c))
    {
        return Ok(h);
    }
    Ok(triangle_hydrology(&tin.point(a), &tin.point(b), &tin.point(c))?)
}

/// 顶点全部邻点上的最速下降
pub fn steepest_descent<M: TinAccess + ?Sized>(
    tin: &M,
    tables: Option<&DrainageTables>,
    p: u32,
) -> DrainageResult<Descent> {
    scan(tin, tables, p, tin.neighbours(p), true)
}

/// 出口外侧扇区（从 `prior` 逆时针到 `next`，含两端）上的最速下降
pub fn exterior_descent<M: TinAccess + ?Sized>(
    tin: &M,
    tables: Option<&DrainageTables>,
    p: u32,
    prior: u32,
    next: u32,
) -> DrainageResult<Descent> {
    let ring = tin.neighbours(p);
    let n = ring.len();
    let Some(start) = ring.iter().position(|&q| q == prior) else {
        return steepest_descent(tin, tables, p);
    };
    let mut fan = Vec::with_capacity(n);
    for k in 0..n {
        let q = ring[(start + k) % n];
        fan.push(q);
        if k > 0 && q == next {
            break;
        }
    }
    let closed = prior == next;
    scan(tin, tables, p, &fan, closed)
}

fn scan<M: TinAccess + ?Sized>(
    tin: &M,
    tables: Option<&DrainageTables>,
    p: u32,
    fan: &[u32],
    closed: bool,
) -> DrainageResult<Descent> {
    let pp = tin.point(p);
    let n = fan.len();
    let mut best = Descent::None;
    let mut best_slope = 0.0;
    let mut flat_triangle: Option<Descent> = None;
    let mut flat_edge: Option<Descent> = None;

    let wedges = if closed { n } else { n.saturating_sub(1) };
    for k in 0..n {
        let q = fan[k];
        let pq = tin.point(q);

        // 沿边
        let dz = pp.z - pq.z;
        let dist = pp.distance_2d(&pq);
        if dz > 0.0 && dist > 0.0 {
            let slope = dz / dist;
            if slope > best_slope {
                best_slope = slope;
                best = Descent::Edge {
                    to: q,
                    slope,
                    sump: is_sump_edge(tin, tables, p, q)?,
                };
            }
        } else if dz == 0.0 && flat_edge.is_none() && !tin.is_boundary(q) {
            flat_edge = Some(Descent::Edge {
                to: q,
                slope: 0.0,
                sump: false,
            });
        }

        // 穿过三角形
        if k >= wedges {
            continue;
        }
        let r = fan[(k + 1) % n];
        if tin.ant_triangle(p, q) != Some(r) {
            continue;
        }
        let h = hydrology(tin, tables, p, q, r)?;
        if h.is_flat() {
            if flat_triangle.is_none() {
                flat_triangle = Some(Descent::Triangle {
                    a: q,
                    b: r,
                    angle: 0.0,
                    slope: 0.0,
                });
            }
            continue;
        }
        let start = pp.xy().angle_to(&pq.xy());
        let span = anticlockwise_sweep(start, pp.xy().angle_to(&tin.point(r).xy()));
        let sweep = anticlockwise_sweep(start, h.descent_angle);
        if sweep > 0.0 && sweep < span && h.slope > best_slope {
            best_slope = h.slope;
            best = Descent::Triangle {
                a: q,
                b: r,
                angle: h.descent_angle,
                slope: h.slope,
            };
        }
    }

    if best_slope > 0.0 {
        return Ok(best);
    }
    Ok(flat_triangle.or(flat_edge).unwrap_or(Descent::None))
}

/// 边 `p-q` 两侧的三角形是否都汇向该边
fn is_sump_edge<M: TinAccess + ?Sized>(
    tin: &M,
    tables: Option<&DrainageTables>,
    p: u32,
    q: u32,
) -> DrainageResult<bool> {
    let (Some(r), Some(s)) = (tin.ant_triangle(p, q), tin.ant_triangle(q, p)) else {
        return Ok(false);
    };
    // (p, q, r) 的第 0 条边、(q, p, s) 的第 0 条边
    let left = hydrology(tin, tables, p, q, r)?.edge_flow[0];
    let right = hydrology(tin, tables, q, p, s)?.edge_flow[0];
    Ok(left == EdgeFlow::Toward && right == EdgeFlow::Toward)
}
