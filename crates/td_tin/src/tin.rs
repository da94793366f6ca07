// crates/td_tin/src/tin.rs

//! 内存三角网
//!
//! 由顶点列表与三角形列表构建，预先计算每个顶点的逆时针邻接环、
//! 凸包前后顶点与空洞标记，之后所有拓扑查询都是 O(邻点数)。
//!
//! # 使用示例
//!
//! ```
//! use td_tin::{Tin, TinAccess};
//! use td_geo::Point3D;
//!
//! let points = vec![
//!     Point3D::new(0.0, 0.0, 1.0),
//!     Point3D::new(1.0, 0.0, 2.0),
//!     Point3D::new(0.0, 1.0, 3.0),
//!     Point3D::new(1.0, 1.0, 4.0),
//! ];
//! let tin = Tin::new(points, &[[0, 1, 3], [0, 3, 2]]).unwrap();
//! assert_eq!(tin.n_triangles(), 2);
//! assert!(tin.is_hull(0));
//! assert_eq!(tin.neighbours(0), &[1, 3, 2]);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use td_foundation::GeoTolerance;
use td_geo::intersect::side_of;
use td_geo::Point3D;
use tracing::debug;

use crate::error::{TinError, TinResult};
use crate::topology::CsrConnectivity;
use crate::traits::TinAccess;

/// 修改戳发生器：每次构建或修改三角网都取一个新值
static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

fn next_stamp() -> u64 {
    NEXT_STAMP.fetch_add(1, Ordering::Relaxed)
}

const NO_POINT: u32 = u32::MAX;

/// 内存三角网
#[derive(Debug, Clone)]
pub struct Tin {
    points: Vec<Point3D>,
    adjacency: CsrConnectivity,
    hull_next: Vec<u32>,
    hull_prev: Vec<u32>,
    void_points: Vec<bool>,
    void_triangles: HashSet<[u32; 3]>,
    n_triangles: usize,
    tolerance: GeoTolerance,
    stamp: u64,
}

impl Tin {
    /// 由顶点与三角形构建三角网
    ///
    /// 三角形顶点顺序任意，构建时统一为逆时针。每条有向边最多属于一个三角形，
    /// 每个顶点周围的三角形扇区必须连续（流形）。
    pub fn new(points: Vec<Point3D>, triangles: &[[u32; 3]]) -> TinResult<Self> {
        let n = points.len();
        let mut successor: Vec<HashMap<u32, u32>> = vec![HashMap::new(); n];

        for tri in triangles {
            for &v in tri {
                if v as usize >= n {
                    return Err(TinError::point_out_of_range(v, n));
                }
            }
            let [a, b, c] = *tri;
            if a == b || b == c || a == c {
                return Err(TinError::DegenerateTriangle { a, b, c });
            }
            let side = side_of(
                &points[a as usize].xy(),
                &points[b as usize].xy(),
                &points[c as usize].xy(),
            );
            let (a, b, c) = if side > 0.0 {
                (a, b, c)
            } else if side < 0.0 {
                (a, c, b)
            } else {
                return Err(TinError::DegenerateTriangle { a, b, c });
            };
            for (p, q, r) in [(a, b, c), (b, c, a), (c, a, b)] {
                if successor[p as usize].insert(q, r).is_some() {
                    return Err(TinError::invalid_topology(
                        "build",
                        format!("有向边 {p}->{q} 属于多个三角形"),
                    ));
                }
            }
        }

        let mut rows: Vec<Vec<u32>> = Vec::with_capacity(n);
        let mut hull_next = vec![NO_POINT; n];
        let mut hull_prev = vec![NO_POINT; n];

        for (p, succ) in successor.iter().enumerate() {
            let p = p as u32;
            if succ.is_empty() {
                rows.push(Vec::new());
                continue;
            }
            let targets: HashSet<u32> = succ.values().copied().collect();
            let mut starts: Vec<u32> = succ.keys().copied().filter(|k| !targets.contains(k)).collect();
            starts.sort_unstable();
            if starts.len() > 1 {
                return Err(TinError::NonManifold {
                    point: p,
                    gaps: starts.len(),
                });
            }
            let on_hull = starts.len() == 1;
            let start = match starts.first() {
                Some(&s) => s,
                None => succ.keys().copied().min().unwrap_or(NO_POINT),
            };

            let mut ring = vec![start];
            let mut current = start;
            while let Some(&next) = succ.get(&current) {
                if next == start || ring.len() > succ.len() {
                    break;
                }
                ring.push(next);
                current = next;
            }

            let expected = if on_hull { succ.len() + 1 } else { succ.len() };
            if ring.len() != expected {
                return Err(TinError::NonManifold { point: p, gaps: 0 });
            }
            if on_hull {
                hull_next[p as usize] = start;
                hull_prev[p as usize] = current;
            }
            rows.push(ring);
        }

        debug!(
            points = n,
            triangles = triangles.len(),
            "三角网拓扑构建完成"
        );

        Ok(Self {
            points,
            adjacency: CsrConnectivity::from_rows(&rows),
            hull_next,
            hull_prev,
            void_points: vec![false; n],
            void_triangles: HashSet::new(),
            n_triangles: triangles.len(),
            tolerance: GeoTolerance::default(),
            stamp: next_stamp(),
        })
    }

    /// 标记空洞三角形
    pub fn with_voids(mut self, void_triangles: &[[u32; 3]]) -> TinResult<Self> {
        for tri in void_triangles {
            let [a, b, c] = *tri;
            let exists = self.is_neighbour(a, b) && self.is_neighbour(b, c) && self.is_neighbour(c, a);
            if !exists {
                return Err(TinError::invalid_topology(
                    "with_voids",
                    format!("三角形 [{a}, {b}, {c}] 不存在"),
                ));
            }
            self.void_triangles.insert(sorted_key(a, b, c));
            for v in [a, b, c] {
                self.void_points[v as usize] = true;
            }
        }
        self.stamp = next_stamp();
        Ok(self)
    }

    /// 设置几何容差
    pub fn with_tolerance(mut self, tolerance: GeoTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// 修改顶点高程（刷新修改戳）
    pub fn set_elevation(&mut self, p: u32, z: f64) -> TinResult<()> {
        let len = self.points.len();
        let point = self
            .points
            .get_mut(p as usize)
            .ok_or(TinError::point_out_of_range(p, len))?;
        point.z = z;
        self.stamp = next_stamp();
        Ok(())
    }

    /// 全部顶点
    #[inline]
    pub fn points(&self) -> &[Point3D] {
        &self.points
    }

    /// 邻接表
    #[inline]
    pub fn adjacency(&self) -> &CsrConnectivity {
        &self.adjacency
    }
}

#[inline]
fn sorted_key(a: u32, b: u32, c: u32) -> [u32; 3] {
    let mut key = [a, b, c];
    key.sort_unstable();
    key
}

#[inline]
fn optional(p: u32) -> Option<u32> {
    (p != NO_POINT).then_some(p)
}

impl TinAccess for Tin {
    #[inline]
    fn n_points(&self) -> usize {
        self.points.len()
    }

    #[inline]
    fn n_triangles(&self) -> usize {
        self.n_triangles
    }

    #[inline]
    fn point(&self, p: u32) -> Point3D {
        self.points[p as usize]
    }

    #[inline]
    fn tolerance(&self) -> GeoTolerance {
        self.tolerance
    }

    #[inline]
    fn stamp(&self) -> u64 {
        self.stamp
    }

    #[inline]
    fn neighbours(&self, p: u32) -> &[u32] {
        self.adjacency.row(p as usize)
    }

    #[inline]
    fn hull_next(&self, p: u32) -> Option<u32> {
        optional(self.hull_next[p as usize])
    }

    #[inline]
    fn hull_prev(&self, p: u32) -> Option<u32> {
        optional(self.hull_prev[p as usize])
    }

    #[inline]
    fn is_void_point(&self, p: u32) -> bool {
        self.void_points[p as usize]
    }

    fn is_void_triangle(&self, a: u32, b: u32, c: u32) -> bool {
        !self.void_triangles.is_empty() && self.void_triangles.contains(&sorted_key(a, b, c))
    }
}

/// 可序列化的三角网数据
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TinData {
    /// 顶点 `[x, y, z]`
    pub points: Vec<[f64; 3]>,
    /// 三角形顶点索引
    pub triangles: Vec<[u32; 3]>,
    /// 空洞三角形
    #[serde(default, alias = "voids")]
    pub void_triangles: Vec<[u32; 3]>,
}

impl TinData {
    /// 从 JSON 文本解析
    pub fn from_json_str(text: &str) -> TinResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// 构建三角网
    pub fn build(&self) -> TinResult<Tin> {
        let points = self.points.iter().map(|&p| Point3D::from(p)).collect();
        let tin = Tin::new(points, &self.triangles)?;
        if self.void_triangles.is_empty() {
            Ok(tin)
        } else {
            tin.with_voids(&self.void_triangles)
        }
    }
}

impl From<&Tin> for TinData {
    fn from(tin: &Tin) -> Self {
        Self {
            points: tin.points.iter().map(|&p| p.into()).collect(),
            triangles: tin.triangles(),
            void_triangles: tin.void_triangles.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 中心点 4 被 0..4 四个角点包围
    fn square_with_centre() -> Tin {
        let points = vec![
            Point3D::new(0.0, 0.0, 1.0),
            Point3D::new(2.0, 0.0, 1.0),
            Point3D::new(2.0, 2.0, 1.0),
            Point3D::new(0.0, 2.0, 1.0),
            Point3D::new(1.0, 1.0, 0.0),
        ];
        Tin::new(points, &[[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]]).unwrap()
    }

    #[test]
    fn test_interior_ring() {
        let tin = square_with_centre();
        assert!(!tin.is_hull(4));
        assert_eq!(tin.neighbours(4), &[0, 1, 2, 3]);
        assert_eq!(tin.next_ant(4, 3), Some(0));
        assert_eq!(tin.next_clk(4, 0), Some(3));
    }

    #[test]
    fn test_hull_ring() {
        let tin = square_with_centre();
        // 角点 0：凸包逆时针 0 -> 1 -> 2 -> 3
        assert_eq!(tin.hull_next(0), Some(1));
        assert_eq!(tin.hull_prev(0), Some(3));
        assert_eq!(tin.neighbours(0), &[1, 4, 3]);
        assert!(tin.has_ant_triangle(0, 1));
        assert!(!tin.has_ant_triangle(0, 3));
        assert_eq!(tin.ant_triangle(0, 1), Some(4));
        assert_eq!(tin.ant_triangle(0, 3), None);
        assert!(tin.is_hull_edge(0, 1));
        assert!(!tin.is_hull_edge(0, 4));
    }

    #[test]
    fn test_clockwise_input_is_reoriented() {
        let points = vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(0.0, 1.0, 0.0),
        ];
        let tin = Tin::new(points, &[[0, 2, 1]]).unwrap();
        assert_eq!(tin.neighbours(0), &[1, 2]);
        assert_eq!(tin.triangles(), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_triangles_listed_once() {
        let tin = square_with_centre();
        let mut tris = tin.triangles();
        tris.sort_unstable();
        assert_eq!(tris, vec![[0, 1, 4], [0, 4, 3], [1, 2, 4], [2, 3, 4]]);
    }

    #[test]
    fn test_rejects_bad_input() {
        let points = vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(2.0, 0.0, 0.0),
        ];
        assert!(matches!(
            Tin::new(points.clone(), &[[0, 1, 2]]),
            Err(TinError::DegenerateTriangle { .. })
        ));
        assert!(matches!(
            Tin::new(points, &[[0, 1, 5]]),
            Err(TinError::PointOutOfRange { index: 5, .. })
        ));
    }

    #[test]
    fn test_voids() {
        let tin = square_with_centre().with_voids(&[[4, 0, 1]]).unwrap();
        assert!(tin.is_void_triangle(0, 1, 4));
        assert!(tin.is_void_point(4));
        assert!(!tin.is_void_point(2));
        assert_eq!(tin.ant_triangle(0, 1), None);
        assert!(tin.is_boundary(4));
    }

    #[test]
    fn test_set_elevation_changes_stamp() {
        let mut tin = square_with_centre();
        let before = tin.stamp();
        tin.set_elevation(4, -2.0).unwrap();
        assert_ne!(tin.stamp(), before);
        assert_eq!(tin.z(4), -2.0);
        assert!(tin.set_elevation(99, 0.0).is_err());
    }

    #[test]
    fn test_tin_data_round_trip() {
        let tin = square_with_centre();
        let data = TinData::from(&tin);
        let text = serde_json::to_string(&data).unwrap();
        let back = TinData::from_json_str(&text).unwrap().build().unwrap();
        assert_eq!(back.n_points(), 5);
        assert_eq!(back.n_triangles(), 4);
    }
}
