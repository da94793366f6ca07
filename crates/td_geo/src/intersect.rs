// crates/td_geo/src/intersect.rs

//! 点线关系与射线求交
//!
//! 追踪水流穿越三角形时，从入口点沿下降方向发出射线，
//! 求它离开三角形的那条边以及交点位置。

use crate::error::{GeoError, GeoResult};
use crate::geometry::{Point2D, Point3D};

/// 点 `p` 相对于有向线段 `a → b` 的位置
///
/// 返回叉积值：`> 0` 在左侧，`< 0` 在右侧，`0` 共线。
#[inline]
pub fn side_of(a: &Point2D, b: &Point2D, p: &Point2D) -> f64 {
    (*b - *a).cross(&(*p - *a))
}

/// 线段上的交点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    /// 沿线段 `a → b` 的参数 `t ∈ [0, 1]`
    pub t: f64,
    /// 交点（高程沿线段线性插值）
    pub point: Point3D,
}

/// 从 `origin` 沿方位角 `angle` 的射线与线段 `a-b` 求交
///
/// 参数 `t` 被截断到 `[0, 1]`，仅当交点落在线段外超过 `tol`（相对线段长度）时失败。
pub fn ray_segment(origin: &Point2D, angle: f64, a: &Point3D, b: &Point3D, tol: f64) -> GeoResult<SegmentHit> {
    let dir = Point2D::new(angle.cos(), angle.sin());
    let seg = b.xy() - a.xy();
    let denom = dir.cross(&seg);
    if denom == 0.0 {
        return Err(GeoError::no_intersection("ray_segment"));
    }
    let diff = a.xy() - *origin;
    let s = diff.cross(&seg) / denom;
    let t = diff.cross(&dir) / denom;
    let len = seg.dot(&seg).sqrt();
    let slack = if len > 0.0 { tol / len } else { 0.0 };
    if s < -tol || t < -slack || t > 1.0 + slack {
        return Err(GeoError::no_intersection("ray_segment"));
    }
    let t = t.clamp(0.0, 1.0);
    Ok(SegmentHit {
        t,
        point: a.lerp(b, t),
    })
}

/// 点到线段 `a-b` 的平面距离及最近点参数
pub fn distance_to_segment(p: &Point2D, a: &Point2D, b: &Point2D) -> (f64, f64) {
    let seg = *b - *a;
    let len2 = seg.dot(&seg);
    if len2 == 0.0 {
        return (p.distance_to(a), 0.0);
    }
    let t = ((*p - *a).dot(&seg) / len2).clamp(0.0, 1.0);
    let foot = *a + seg * t;
    (p.distance_to(&foot), t)
}

/// 点是否位于三角形内（含边界，按三角形实际绕向判断）
pub fn point_in_triangle(p: &Point2D, a: &Point2D, b: &Point2D, c: &Point2D, tol: f64) -> bool {
    let orient = side_of(a, b, c).signum();
    if orient == 0.0 {
        return false;
    }
    let scale = (side_of(a, b, c)).abs().sqrt();
    let eps = tol * scale;
    side_of(a, b, p) * orient >= -eps
        && side_of(b, c, p) * orient >= -eps
        && side_of(c, a, p) * orient >= -eps
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_side_of() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(1.0, 0.0);
        assert!(side_of(&a, &b, &Point2D::new(0.5, 1.0)) > 0.0);
        assert!(side_of(&a, &b, &Point2D::new(0.5, -1.0)) < 0.0);
        assert_eq!(side_of(&a, &b, &Point2D::new(2.0, 0.0)), 0.0);
    }

    #[test]
    fn test_ray_segment_hit() {
        let a = Point3D::new(-1.0, 1.0, 0.0);
        let b = Point3D::new(1.0, 1.0, 2.0);
        let hit = ray_segment(&Point2D::ZERO, FRAC_PI_2, &a, &b, 1e-9).unwrap();
        assert!((hit.t - 0.5).abs() < 1e-12);
        assert!((hit.point.x).abs() < 1e-12);
        assert!((hit.point.y - 1.0).abs() < 1e-12);
        assert!((hit.point.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ray_segment_miss() {
        let a = Point3D::new(2.0, 1.0, 0.0);
        let b = Point3D::new(3.0, 1.0, 0.0);
        assert!(ray_segment(&Point2D::ZERO, FRAC_PI_2, &a, &b, 1e-9).is_err());
        // 射线反方向
        let a = Point3D::new(-1.0, -1.0, 0.0);
        let b = Point3D::new(1.0, -1.0, 0.0);
        assert!(ray_segment(&Point2D::ZERO, FRAC_PI_2, &a, &b, 1e-9).is_err());
    }

    #[test]
    fn test_distance_to_segment() {
        let (d, t) = distance_to_segment(
            &Point2D::new(0.5, 1.0),
            &Point2D::new(0.0, 0.0),
            &Point2D::new(1.0, 0.0),
        );
        assert!((d - 1.0).abs() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_point_in_triangle() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(1.0, 0.0);
        let c = Point2D::new(0.0, 1.0);
        assert!(point_in_triangle(&Point2D::new(0.2, 0.2), &a, &b, &c, 1e-9));
        assert!(point_in_triangle(&Point2D::new(0.5, 0.0), &a, &b, &c, 1e-9));
        assert!(!point_in_triangle(&Point2D::new(1.0, 1.0), &a, &b, &c, 1e-9));
        // 顺时针顶点顺序同样适用
        assert!(point_in_triangle(&Point2D::new(0.2, 0.2), &a, &c, &b, 1e-9));
    }
}
