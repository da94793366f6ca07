// crates/td_drainage/src/pond/polygon.rs

//! 水面多边形
//!
//! 沿每条边界环走一遍：环上顶点高于水位时，在它与湿侧邻点的连线上
//! 插值出水线点；顶点本身不高于水位时直接取该点。
//! 外环多边形逆时针，岛多边形顺时针。

use td_geo::polygon::close_polygon;
use td_geo::Point3D;
use td_tin::TinAccess;

use super::PondAnalysis;
use crate::ring::{BoundaryRing, RingLocation};

impl PondAnalysis {
    /// 当前边界在水位 `elevation` 处的水面多边形，外环在前
    ///
    /// 水位应位于 `current_z` 与下一个环上高程之间。
    pub fn polygon_at_elevation<M: TinAccess + ?Sized>(&self, tin: &M, elevation: f64) -> Vec<Vec<Point3D>> {
        let mut order: Vec<&BoundaryRing> = self.rings.iter().filter(|r| !r.is_empty()).collect();
        order.sort_by_key(|r| r.location != RingLocation::Outer);
        order
            .into_iter()
            .filter_map(|ring| ring_polygon(tin, ring, elevation))
            .collect()
    }

    /// 洼地水面边界：部分充水取充水水位，否则取出口高程
    pub fn boundary<M: TinAccess + ?Sized>(&self, tin: &M) -> Vec<Vec<Point3D>> {
        let z = self.fill_z.or(self.exit_z).unwrap_or(self.current_z);
        self.polygon_at_elevation(tin, z)
    }
}

fn ring_polygon<M: TinAccess + ?Sized>(tin: &M, ring: &BoundaryRing, elevation: f64) -> Option<Vec<Point3D>> {
    let mut out: Vec<Point3D> = Vec::new();
    let mut push = |p: Point3D| {
        if out.last().map_or(true, |last| !last.same_xy(&p)) {
            out.push(p);
        }
    };
    for i in 0..ring.len() {
        let v = ring.at(i);
        let pv = tin.point(v);
        if pv.z <= elevation {
            push(pv.with_z(elevation));
            continue;
        }
        let prev = ring.at(ring.prev_index(i));
        let next = ring.at(ring.next_index(i));
        for q in wet_sector(tin, v, prev, next) {
            let pq = tin.point(q);
            if pq.z > elevation {
                continue;
            }
            let dz = pv.z - pq.z;
            let t = if dz <= 0.0 {
                0.0
            } else {
                ((pv.z - elevation) / dz).clamp(0.0, 1.0)
            };
            push(pv.lerp(&pq, t).with_z(elevation));
        }
    }
    if out.len() > 1 && out[0].same_xy(&out[out.len() - 1]) {
        out.pop();
    }
    if out.len() < 3 {
        return None;
    }
    close_polygon(&mut out);
    Some(out)
}

/// 绕 `v` 从 `prev` 顺时针到 `next` 之间的邻点（不含两端）
fn wet_sector<M: TinAccess + ?Sized>(tin: &M, v: u32, prev: u32, next: u32) -> Vec<u32> {
    let ring = tin.neighbours(v);
    let n = ring.len();
    let start = ring.iter().position(|&q| q == prev);
    match start {
        None => (0..n).map(|k| ring[(n - k) % n]).collect(),
        Some(s) => (1..n)
            .map(|k| ring[(s + n - k) % n])
            .take_while(|&q| q != next)
            .collect(),
    }
}
