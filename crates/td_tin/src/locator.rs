// crates/td_tin/src/locator.rs

//! 三角网点定位
//!
//! 用两棵 R-tree 把平面坐标定位到三角网上：顶点索引负责吸附，
//! 三角形包围盒索引负责筛选候选三角形，再做精确的点在三角形内判断。
//!
//! 定位结果按优先级区分：顶点（容差内）> 边（容差内）> 三角形内部 > 空洞 > 网格外。

use td_geo::intersect::{distance_to_segment, point_in_triangle, side_of};
use td_geo::plane::TrianglePlane;
use td_geo::spatial_index::{BoundingBox, EnvelopeIndex, PointIndex};
use td_geo::{Point2D, Point3D};

use crate::traits::TinAccess;

/// 定位结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Located {
    /// 位于网格之外
    OffMesh,
    /// 位于空洞三角形内
    Void,
    /// 与顶点重合
    Point {
        /// 顶点索引
        point: u32,
        /// 位置（顶点高程）
        at: Point3D,
    },
    /// 位于边上，`(p1, p2, next_ant(p1, p2))` 为逆时针三角形
    Edge {
        /// 边起点
        p1: u32,
        /// 边终点
        p2: u32,
        /// 位置（沿边插值的高程）
        at: Point3D,
    },
    /// 位于三角形内部（逆时针）
    Triangle {
        /// 顶点 1
        p1: u32,
        /// 顶点 2
        p2: u32,
        /// 顶点 3
        p3: u32,
        /// 位置（平面插值的高程）
        at: Point3D,
    },
}

impl Located {
    /// 定位点坐标，网格外与空洞返回 None
    pub fn position(&self) -> Option<Point3D> {
        match *self {
            Self::Point { at, .. } | Self::Edge { at, .. } | Self::Triangle { at, .. } => Some(at),
            Self::OffMesh | Self::Void => None,
        }
    }
}

/// 三角网点定位器
pub struct TinLocator {
    vertices: PointIndex<u32>,
    triangles: EnvelopeIndex<[u32; 3]>,
}

impl TinLocator {
    /// 为三角网建立索引（孤立顶点不参与吸附）
    pub fn new<M: TinAccess + ?Sized>(tin: &M) -> Self {
        let vertices = (0..tin.n_points() as u32)
            .filter(|&p| !tin.neighbours(p).is_empty())
            .map(|p| (tin.point(p).xy(), p))
            .collect();
        let triangles = tin
            .triangles()
            .into_iter()
            .filter_map(|tri| {
                let pts = tri.map(|p| tin.point(p).xy());
                BoundingBox::from_points(pts.iter()).map(|bbox| (bbox, tri))
            })
            .collect();
        Self {
            vertices: PointIndex::bulk_load(vertices),
            triangles: EnvelopeIndex::bulk_load(triangles),
        }
    }

    /// 参与定位的三角形数量
    pub fn n_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// 定位平面坐标
    pub fn locate<M: TinAccess + ?Sized>(&self, tin: &M, x: f64, y: f64) -> Located {
        let p = Point2D::new(x, y);
        let tol = tin.tolerance();

        if let Some((_, &vertex)) = self.vertices.nearest(&p) {
            if tin.point(vertex).xy().distance_to(&p) <= tol.point {
                return Located::Point {
                    point: vertex,
                    at: tin.point(vertex),
                };
            }
        }

        let mut in_void = false;
        for &[a, b, c] in self.triangles.containing(&p) {
            let (pa, pb, pc) = (tin.point(a), tin.point(b), tin.point(c));
            if !point_in_triangle(&p, &pa.xy(), &pb.xy(), &pc.xy(), tol.line) {
                continue;
            }
            // triangles() 返回的三角形已是逆时针
            for (e1, e2) in [(a, b), (b, c), (c, a)] {
                let (q1, q2) = (tin.point(e1), tin.point(e2));
                let (dist, t) = distance_to_segment(&p, &q1.xy(), &q2.xy());
                if dist <= tol.line {
                    let void_here = tin.is_void_triangle(a, b, c);
                    let void_there = tin
                        .ant_triangle(e2, e1)
                        .map_or(true, |o| tin.is_void_triangle(e2, e1, o));
                    if void_here && void_there {
                        in_void = true;
                        break;
                    }
                    let (p1, p2) = if void_here { (e2, e1) } else { (e1, e2) };
                    let at = q1.lerp(&q2, t);
                    return Located::Edge {
                        p1,
                        p2,
                        at: Point3D::new(x, y, at.z),
                    };
                }
            }
            if in_void {
                continue;
            }
            if tin.is_void_triangle(a, b, c) {
                in_void = true;
                continue;
            }
            let z = match TrianglePlane::from_points(&pa, &pb, &pc) {
                Ok(plane) => plane.z_at(x, y),
                Err(_) => (pa.z + pb.z + pc.z) / 3.0,
            };
            let (p2, p3) = if side_of(&pa.xy(), &pb.xy(), &pc.xy()) < 0.0 {
                (c, b)
            } else {
                (b, c)
            };
            return Located::Triangle {
                p1: a,
                p2,
                p3,
                at: Point3D::new(x, y, z),
            };
        }

        if in_void {
            Located::Void
        } else {
            Located::OffMesh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tin::Tin;

    fn two_triangles() -> Tin {
        let points = vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(2.0, 0.0, 2.0),
            Point3D::new(2.0, 2.0, 4.0),
            Point3D::new(0.0, 2.0, 2.0),
        ];
        Tin::new(points, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_locate_vertex() {
        let tin = two_triangles();
        let locator = TinLocator::new(&tin);
        assert!(matches!(
            locator.locate(&tin, 2.0, 2.0),
            Located::Point { point: 2, .. }
        ));
    }

    #[test]
    fn test_locate_edge() {
        let tin = two_triangles();
        let locator = TinLocator::new(&tin);
        match locator.locate(&tin, 1.0, 1.0) {
            Located::Edge { p1, p2, at } => {
                let mut e = [p1, p2];
                e.sort_unstable();
                assert_eq!(e, [0, 2]);
                assert!((at.z - 2.0).abs() < 1e-12);
                assert!(tin.ant_triangle(p1, p2).is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_locate_triangle_interpolates_z() {
        let tin = two_triangles();
        let locator = TinLocator::new(&tin);
        match locator.locate(&tin, 1.5, 0.5) {
            Located::Triangle { p1, p2, p3, at } => {
                assert_eq!([p1, p2, p3], [0, 1, 2]);
                assert!((at.z - 2.0).abs() < 1e-12);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_locate_off_mesh_and_void() {
        let tin = two_triangles().with_voids(&[[0, 2, 3]]).unwrap();
        let locator = TinLocator::new(&tin);
        assert_eq!(locator.locate(&tin, 5.0, 5.0), Located::OffMesh);
        assert_eq!(locator.locate(&tin, 0.5, 1.5), Located::Void);
        assert!(locator.locate(&tin, 1.5, 0.5).position().is_some());
    }
}
