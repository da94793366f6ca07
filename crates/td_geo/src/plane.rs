// crates/td_geo/src/plane.rs

//! 三角形平面水文属性
//!
//! 三角形三个顶点确定一个平面 `z = a·x + b·y + c`，由此得到：
//!
//! - 坡度 `|∇z|`
//! - 最速下降方向（`-∇z` 的方位角）与最速上升方向
//! - 每条边的水流方向：三角形上的水是流向该边、平行于该边，还是离开该边
//!
//! 三个顶点高程完全相等的三角形视为平三角形，坡度为 0，方向无定义（取 0）。

use crate::error::{GeoError, GeoResult};
use crate::geometry::{normalize_angle, Point2D, Point3D};
use serde::{Deserialize, Serialize};

/// 边水流方向
///
/// 描述三角形 `(p1, p2, p3)` 上的水相对于边 `p1-p2` 的运动方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeFlow {
    /// 水流离开该边，进入三角形内部
    Away,
    /// 水流平行于该边（或平三角形）
    Parallel,
    /// 水流汇向该边
    Toward,
}

impl EdgeFlow {
    /// 水是否不会从该边进入三角形（汇向或平行）
    #[inline]
    pub fn drains_to_edge(self) -> bool {
        !matches!(self, Self::Away)
    }

    /// 有符号编码：-1 离开，0 平行，1 汇入
    #[inline]
    pub fn signum(self) -> i8 {
        match self {
            Self::Away => -1,
            Self::Parallel => 0,
            Self::Toward => 1,
        }
    }
}

/// 三角形平面
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrianglePlane {
    /// x 方向梯度
    pub a: f64,
    /// y 方向梯度
    pub b: f64,
    /// 常数项
    pub c: f64,
}

impl TrianglePlane {
    /// 由三个顶点构造平面
    pub fn from_points(p1: &Point3D, p2: &Point3D, p3: &Point3D) -> GeoResult<Self> {
        let u = *p2 - *p1;
        let v = *p3 - *p1;
        let n = u.cross(&v);
        if n.z.abs() <= f64::EPSILON * (u.x.abs() + u.y.abs()) * (v.x.abs() + v.y.abs()) {
            return Err(GeoError::degenerate_triangle("plane", n.z * 0.5));
        }
        let a = -n.x / n.z;
        let b = -n.y / n.z;
        Ok(Self {
            a,
            b,
            c: p1.z - a * p1.x - b * p1.y,
        })
    }

    /// 平面在 (x, y) 处的高程
    #[inline]
    pub fn z_at(&self, x: f64, y: f64) -> f64 {
        self.a * x + self.b * y + self.c
    }

    /// 坡度（高程变化 / 水平距离）
    #[inline]
    pub fn slope(&self) -> f64 {
        self.a.hypot(self.b)
    }

    /// 最速下降方位角
    #[inline]
    pub fn descent_angle(&self) -> f64 {
        normalize_angle((-self.b).atan2(-self.a))
    }

    /// 最速上升方位角
    #[inline]
    pub fn ascent_angle(&self) -> f64 {
        normalize_angle(self.b.atan2(self.a))
    }
}

/// 三角形水文属性
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleHydrology {
    /// 坡度
    pub slope: f64,
    /// 最速下降方位角
    pub descent_angle: f64,
    /// 最速上升方位角
    pub ascent_angle: f64,
    /// 三条边 `(p1,p2)`, `(p2,p3)`, `(p3,p1)` 的水流方向
    pub edge_flow: [EdgeFlow; 3],
}

impl TriangleHydrology {
    /// 平三角形
    pub const FLAT: Self = Self {
        slope: 0.0,
        descent_angle: 0.0,
        ascent_angle: 0.0,
        edge_flow: [EdgeFlow::Parallel; 3],
    };

    /// 是否为平三角形
    #[inline]
    pub fn is_flat(&self) -> bool {
        self.slope == 0.0
    }
}

/// 三个顶点高程是否完全相等
#[inline]
pub fn is_flat_triangle(p1: &Point3D, p2: &Point3D, p3: &Point3D) -> bool {
    p1.z == p2.z && p2.z == p3.z
}

/// 计算三角形水文属性
pub fn triangle_hydrology(p1: &Point3D, p2: &Point3D, p3: &Point3D) -> GeoResult<TriangleHydrology> {
    if is_flat_triangle(p1, p2, p3) {
        return Ok(TriangleHydrology::FLAT);
    }
    let plane = TrianglePlane::from_points(p1, p2, p3)?;
    let descent = plane.descent_angle();
    Ok(TriangleHydrology {
        slope: plane.slope(),
        descent_angle: descent,
        ascent_angle: plane.ascent_angle(),
        edge_flow: [
            classify_edge(p1, p2, p3, descent),
            classify_edge(p2, p3, p1, descent),
            classify_edge(p3, p1, p2, descent),
        ],
    })
}

/// 三角形 `(p1, p2, p3)` 上水流相对于边 `p1-p2` 的方向
pub fn edge_flow(p1: &Point3D, p2: &Point3D, p3: &Point3D) -> GeoResult<EdgeFlow> {
    if is_flat_triangle(p1, p2, p3) {
        return Ok(EdgeFlow::Parallel);
    }
    let plane = TrianglePlane::from_points(p1, p2, p3)?;
    Ok(classify_edge(p1, p2, p3, plane.descent_angle()))
}

fn classify_edge(p1: &Point3D, p2: &Point3D, apex: &Point3D, descent: f64) -> EdgeFlow {
    let edge = p2.xy() - p1.xy();
    let dir = Point2D::new(descent.cos(), descent.sin());
    let flow = edge.cross(&dir);
    let apex_side = edge.cross(&(apex.xy() - p1.xy()));
    let scale = edge.dot(&edge).sqrt();
    if flow.abs() <= 1e-12 * scale {
        EdgeFlow::Parallel
    } else if flow * apex_side > 0.0 {
        EdgeFlow::Away
    } else {
        EdgeFlow::Toward
    }
}
