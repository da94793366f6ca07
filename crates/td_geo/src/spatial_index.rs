// crates/td_geo/src/spatial_index.rs
//! 空间索引实现
//!
//! 基于 R-tree 的空间索引：
//!
//! - [`PointIndex`]: 点索引，用于顶点吸附与最近点查询
//! - [`EnvelopeIndex`]: 包围盒索引，用于三角形候选查询
//!
//! # 示例
//!
//! ```
//! use td_geo::spatial_index::{PointIndex, BoundingBox};
//! use td_geo::geometry::Point2D;
//!
//! let index = PointIndex::bulk_load(vec![
//!     (Point2D::new(10.0, 20.0), 1u32),
//!     (Point2D::new(15.0, 25.0), 2u32),
//! ]);
//! let nearest = index.nearest(&Point2D::new(11.0, 21.0));
//! assert_eq!(nearest.map(|(_, id)| *id), Some(1));
//! ```

use crate::geometry::Point2D;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// 边界框
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// 最小 x
    pub min_x: f64,
    /// 最小 y
    pub min_y: f64,
    /// 最大 x
    pub max_x: f64,
    /// 最大 y
    pub max_y: f64,
}

impl BoundingBox {
    /// 创建新的边界框
    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// 点集的包围盒，空点集返回 None
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2D>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first.x, first.y, first.x, first.y);
        for p in iter {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        Some(bbox)
    }

    /// 检查点是否在边界框内
    #[must_use]
    pub fn contains_point(&self, point: &Point2D) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// 合并两个边界框
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// 扩展边界框
    #[must_use]
    pub fn expand(&self, amount: f64) -> Self {
        Self {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    fn to_aabb(self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

// ============================================================================
// 点索引
// ============================================================================

#[derive(Debug, Clone)]
struct PointEntry<T> {
    point: Point2D,
    data: T,
}

impl<T> RTreeObject for PointEntry<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.x, self.point.y])
    }
}

impl<T> PointDistance for PointEntry<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point.x - point[0];
        let dy = self.point.y - point[1];
        dx * dx + dy * dy
    }
}

/// 点空间索引
pub struct PointIndex<T> {
    tree: RTree<PointEntry<T>>,
}

impl<T> PointIndex<T> {
    /// 从点集批量构建
    #[must_use]
    pub fn bulk_load(points: Vec<(Point2D, T)>) -> Self {
        let entries = points
            .into_iter()
            .map(|(point, data)| PointEntry { point, data })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// 最近点
    #[must_use]
    pub fn nearest(&self, point: &Point2D) -> Option<(&Point2D, &T)> {
        self.tree
            .nearest_neighbor(&[point.x, point.y])
            .map(|entry| (&entry.point, &entry.data))
    }

    /// 指定距离内的全部点
    #[must_use]
    pub fn within_distance(&self, point: &Point2D, distance: f64) -> Vec<(&Point2D, &T)> {
        self.tree
            .locate_within_distance([point.x, point.y], distance * distance)
            .map(|entry| (&entry.point, &entry.data))
            .collect()
    }

    /// 点数量
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

// ============================================================================
// 包围盒索引
// ============================================================================

#[derive(Debug, Clone)]
struct EnvelopeEntry<T> {
    bbox: BoundingBox,
    data: T,
}

impl<T> RTreeObject for EnvelopeEntry<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bbox.to_aabb()
    }
}

impl<T> PointDistance for EnvelopeEntry<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = (self.bbox.min_x - point[0]).max(point[0] - self.bbox.max_x).max(0.0);
        let dy = (self.bbox.min_y - point[1]).max(point[1] - self.bbox.max_y).max(0.0);
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.bbox.contains_point(&Point2D::new(point[0], point[1]))
    }
}

/// 包围盒空间索引
pub struct EnvelopeIndex<T> {
    tree: RTree<EnvelopeEntry<T>>,
}

impl<T> EnvelopeIndex<T> {
    /// 批量构建
    #[must_use]
    pub fn bulk_load(items: Vec<(BoundingBox, T)>) -> Self {
        let entries = items
            .into_iter()
            .map(|(bbox, data)| EnvelopeEntry { bbox, data })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// 包含该点的全部包围盒对应数据
    pub fn containing(&self, point: &Point2D) -> impl Iterator<Item = &T> {
        self.tree
            .locate_all_at_point(&[point.x, point.y])
            .map(|entry| &entry.data)
    }

    /// 与查询框相交的全部包围盒对应数据
    pub fn intersecting(&self, bbox: &BoundingBox) -> impl Iterator<Item = &T> {
        self.tree
            .locate_in_envelope_intersecting(&bbox.to_aabb())
            .map(|entry| &entry.data)
    }

    /// 条目数量
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let pts = [Point2D::new(1.0, 5.0), Point2D::new(-2.0, 3.0)];
        let bbox = BoundingBox::from_points(pts.iter()).unwrap();
        assert_eq!(bbox, BoundingBox::new(-2.0, 3.0, 1.0, 5.0));
        assert!(bbox.contains_point(&Point2D::new(0.0, 4.0)));
        assert!(!bbox.contains_point(&Point2D::new(0.0, 6.0)));
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_bounding_box_merge() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 20.0, 20.0);
        assert_eq!(a.merge(&b), BoundingBox::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(a.expand(1.0), BoundingBox::new(-1.0, -1.0, 11.0, 11.0));
    }

    #[test]
    fn test_point_index() {
        let index = PointIndex::bulk_load(vec![
            (Point2D::new(0.0, 0.0), 0u32),
            (Point2D::new(5.0, 0.0), 1),
            (Point2D::new(100.0, 0.0), 2),
        ]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.nearest(&Point2D::new(4.0, 1.0)).map(|(_, d)| *d), Some(1));
        assert_eq!(index.within_distance(&Point2D::ZERO, 10.0).len(), 2);
    }

    #[test]
    fn test_envelope_index() {
        let index = EnvelopeIndex::bulk_load(vec![
            (BoundingBox::new(0.0, 0.0, 1.0, 1.0), 'a'),
            (BoundingBox::new(0.5, 0.5, 2.0, 2.0), 'b'),
        ]);
        let mut hits: Vec<char> = index.containing(&Point2D::new(0.75, 0.75)).copied().collect();
        hits.sort_unstable();
        assert_eq!(hits, vec!['a', 'b']);
        assert_eq!(index.containing(&Point2D::new(1.5, 1.5)).count(), 1);
        assert_eq!(
            index
                .intersecting(&BoundingBox::new(3.0, 3.0, 4.0, 4.0))
                .count(),
            0
        );
    }
}
