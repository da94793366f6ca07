// crates/td_geo/src/volume.rs

//! 三棱柱到水平面的挖填方计算
//!
//! 三角形面片与水平面 `z = elevation` 之间的体积：
//!
//! - **填方**（fill）：面片低于水平面的部分，即该三角形在此水位下能蓄的水量
//! - **挖方**（cut）：面片高于水平面的部分
//!
//! 面片高程在三角形内线性变化，先用水平面裁剪三角形，再对裁剪多边形做扇形剖分，
//! 每个子三角形的体积为 `面积 × 三顶点深度均值`，结果精确。

use crate::geometry::{Point2D, Point3D};

/// 挖填方结果
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PrismVolume {
    /// 挖方体积
    pub cut_volume: f64,
    /// 填方体积
    pub fill_volume: f64,
    /// 挖方平面面积
    pub cut_area: f64,
    /// 填方平面面积
    pub fill_area: f64,
}

/// 计算三角形面片相对水平面的挖填方
pub fn prism_to_plane(p1: &Point3D, p2: &Point3D, p3: &Point3D, elevation: f64) -> PrismVolume {
    let pts = [*p1, *p2, *p3];
    let (fill_area, fill_volume) = clipped_integral(&pts, |p| elevation - p.z);
    let (cut_area, cut_volume) = clipped_integral(&pts, |p| p.z - elevation);
    PrismVolume {
        cut_volume,
        fill_volume,
        cut_area,
        fill_area,
    }
}

/// 三角形平面面积（绝对值）
#[inline]
pub fn triangle_area(p1: &Point2D, p2: &Point2D, p3: &Point2D) -> f64 {
    ((*p2 - *p1).cross(&(*p3 - *p1)) * 0.5).abs()
}

/// 对 `depth >= 0` 的区域积分，返回 (面积, 体积)
fn clipped_integral(pts: &[Point3D; 3], depth: impl Fn(&Point3D) -> f64) -> (f64, f64) {
    let mut poly: Vec<(Point2D, f64)> = Vec::with_capacity(4);
    for i in 0..3 {
        let a = &pts[i];
        let b = &pts[(i + 1) % 3];
        let da = depth(a);
        let db = depth(b);
        if da >= 0.0 {
            poly.push((a.xy(), da));
        }
        if (da > 0.0 && db < 0.0) || (da < 0.0 && db > 0.0) {
            let t = da / (da - db);
            let p = a.xy() + (b.xy() - a.xy()) * t;
            poly.push((p, 0.0));
        }
    }
    if poly.len() < 3 {
        return (0.0, 0.0);
    }
    let (p0, d0) = poly[0];
    let mut area = 0.0;
    let mut volume = 0.0;
    for k in 1..poly.len() - 1 {
        let (pk, dk) = poly[k];
        let (pn, dn) = poly[k + 1];
        let sub = triangle_area(&p0, &pk, &pn);
        area += sub;
        volume += sub * (d0 + dk + dn) / 3.0;
    }
    (area, volume)
}
