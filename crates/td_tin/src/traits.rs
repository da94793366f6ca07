// crates/td_tin/src/traits.rs

//! 三角网只读访问接口（TinAccess）
//!
//! 排水分析引擎只通过此 trait 访问三角网，三角网在一次分析期间只读。
//!
//! # 拓扑约定
//!
//! - 每个顶点的邻点按**逆时针**排列成环
//! - 凸包按逆时针方向环绕，内部位于 `p → hull_next(p)` 的左侧
//! - 凸包顶点 `p` 的邻点环从 `hull_next(p)` 开始、到 `hull_prev(p)` 结束；
//!   `(p, hull_prev(p), hull_next(p))` 不构成三角形（网格外缺口）
//! - 空洞三角形存在于拓扑中，但不参与水流；空洞顶点按凸包顶点对待
//!
//! # 使用示例
//!
//! ```ignore
//! use td_tin::traits::TinAccess;
//!
//! fn lowest_point<M: TinAccess>(tin: &M) -> Option<u32> {
//!     (0..tin.n_points() as u32).min_by(|&a, &b| tin.z(a).total_cmp(&tin.z(b)))
//! }
//! ```

use td_foundation::GeoTolerance;
use td_geo::Point3D;

// =========================================================================
// TinAccess - 三角网只读访问接口
// =========================================================================

/// 三角网访问接口（只读）
pub trait TinAccess: Send + Sync {
    // ===== 基本计数 =====

    /// 顶点总数
    fn n_points(&self) -> usize;

    /// 三角形总数
    fn n_triangles(&self) -> usize;

    // ===== 几何查询 =====

    /// 顶点坐标
    fn point(&self, p: u32) -> Point3D;

    /// 顶点高程
    #[inline]
    fn z(&self, p: u32) -> f64 {
        self.point(p).z
    }

    /// 几何容差
    fn tolerance(&self) -> GeoTolerance;

    /// 修改戳：任何高程或拓扑修改都会改变此值
    fn stamp(&self) -> u64;

    // ===== 拓扑查询 =====

    /// 逆时针排列的邻点
    fn neighbours(&self, p: u32) -> &[u32];

    /// 凸包上的下一个顶点（内部顶点返回 None）
    fn hull_next(&self, p: u32) -> Option<u32>;

    /// 凸包上的上一个顶点（内部顶点返回 None）
    fn hull_prev(&self, p: u32) -> Option<u32>;

    /// 顶点是否位于凸包上
    #[inline]
    fn is_hull(&self, p: u32) -> bool {
        self.hull_next(p).is_some()
    }

    /// 顶点是否与空洞三角形相邻
    fn is_void_point(&self, p: u32) -> bool;

    /// 三角形是否属于空洞
    fn is_void_triangle(&self, a: u32, b: u32, c: u32) -> bool;

    /// 顶点是否为水流可离开网格之处（凸包或空洞边界）
    #[inline]
    fn is_boundary(&self, p: u32) -> bool {
        self.is_hull(p) || self.is_void_point(p)
    }

    // ===== 派生查询 =====

    /// 绕 `p` 从 `q` 逆时针转到的下一个邻点
    fn next_ant(&self, p: u32, q: u32) -> Option<u32> {
        let ring = self.neighbours(p);
        let i = ring.iter().position(|&v| v == q)?;
        Some(ring[(i + 1) % ring.len()])
    }

    /// 绕 `p` 从 `q` 顺时针转到的下一个邻点
    fn next_clk(&self, p: u32, q: u32) -> Option<u32> {
        let ring = self.neighbours(p);
        let i = ring.iter().position(|&v| v == q)?;
        Some(ring[(i + ring.len() - 1) % ring.len()])
    }

    /// 两点是否相邻
    #[inline]
    fn is_neighbour(&self, p: u32, q: u32) -> bool {
        self.neighbours(p).contains(&q)
    }

    /// 逆时针三角形 `(p, q, next_ant(p, q))` 是否存在（且不属于网格外缺口）
    #[inline]
    fn has_ant_triangle(&self, p: u32, q: u32) -> bool {
        self.hull_prev(p) != Some(q) && self.is_neighbour(p, q)
    }

    /// 逆时针三角形 `(p, q, next_ant(p, q))`，不存在或为空洞时返回 None
    fn ant_triangle(&self, p: u32, q: u32) -> Option<u32> {
        if !self.has_ant_triangle(p, q) {
            return None;
        }
        let r = self.next_ant(p, q)?;
        if self.is_void_triangle(p, q, r) {
            None
        } else {
            Some(r)
        }
    }

    /// 边 `p-q` 是否位于凸包上
    #[inline]
    fn is_hull_edge(&self, p: u32, q: u32) -> bool {
        self.hull_next(p) == Some(q) || self.hull_next(q) == Some(p)
    }

    /// 全部三角形（每个三角形只出现一次，逆时针，最小索引在前）
    fn triangles(&self) -> Vec<[u32; 3]> {
        let mut out = Vec::with_capacity(self.n_triangles());
        for p in 0..self.n_points() as u32 {
            let ring = self.neighbours(p);
            for (i, &q) in ring.iter().enumerate() {
                if self.hull_prev(p) == Some(q) {
                    continue;
                }
                let r = ring[(i + 1) % ring.len()];
                if p < q && p < r {
                    out.push([p, q, r]);
                }
            }
        }
        out
    }
}
