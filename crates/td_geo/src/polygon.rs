// crates/td_geo/src/polygon.rs

//! 多边形方向与面积

use crate::geometry::{Point2D, Point3D};

/// 多边形绕向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    /// 逆时针（有向面积为正）
    Anticlockwise,
    /// 顺时针（有向面积为负）
    Clockwise,
    /// 退化（面积为零）
    Degenerate,
}

/// 有向面积（鞋带公式），逆时针为正
///
/// 多边形可以闭合（首点重复于末尾）也可以不闭合，结果相同。
pub fn signed_area<P: Copy + Into<Point2D>>(points: &[P]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a: Point2D = points[i].into();
        let b: Point2D = points[(i + 1) % n].into();
        sum += a.cross(&b);
    }
    sum * 0.5
}

/// 多边形绕向
pub fn winding<P: Copy + Into<Point2D>>(points: &[P]) -> Winding {
    let area = signed_area(points);
    if area > 0.0 {
        Winding::Anticlockwise
    } else if area < 0.0 {
        Winding::Clockwise
    } else {
        Winding::Degenerate
    }
}

/// 闭合多边形：若首尾不同则在末尾补上首点
pub fn close_polygon(points: &mut Vec<Point3D>) {
    if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) {
        if points.len() > 1 && !first.same_xy(&last) {
            points.push(first);
        }
    }
}
