// crates/td_geo/src/lib.rs
//! 地形排水分析几何内核
//!
//! 为三角网水流追踪提供纯函数式的几何计算。
//!
//! # 模块
//!
//! - `geometry`: 几何类型 (Point2D, Point3D) 与角度工具
//! - `plane`: 三角形平面的坡度、最速下降/上升方向、边水流方向
//! - `intersect`: 点线位置关系、射线与线段求交
//! - `volume`: 三棱柱到水平面的挖填方体积与面积
//! - `polygon`: 多边形有向面积与绕向
//! - `spatial_index`: 基于 R-tree 的空间索引
//!
//! # 示例
//!
//! ```
//! use td_geo::prelude::*;
//!
//! let a = Point3D::new(0.0, 0.0, 0.0);
//! let b = Point3D::new(1.0, 0.0, 3.0);
//! let c = Point3D::new(0.0, 1.0, 3.0);
//! let v = prism_to_plane(&a, &b, &c, 3.0);
//! assert!((v.fill_volume - 0.5).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod geometry;
pub mod intersect;
pub mod plane;
pub mod polygon;
pub mod spatial_index;
pub mod volume;

/// 预导入模块
pub mod prelude {
    pub use crate::error::{GeoError, GeoResult};
    pub use crate::geometry::{anticlockwise_sweep, normalize_angle, Point2D, Point3D};
    pub use crate::intersect::{ray_segment, side_of, SegmentHit};
    pub use crate::plane::{edge_flow, triangle_hydrology, EdgeFlow, TriangleHydrology};
    pub use crate::polygon::{signed_area, winding, Winding};
    pub use crate::spatial_index::{BoundingBox, EnvelopeIndex, PointIndex};
    pub use crate::volume::{prism_to_plane, PrismVolume};
}

// 重导出常用类型
pub use error::{GeoError, GeoResult};
pub use geometry::{Point2D, Point3D};
pub use plane::{EdgeFlow, TriangleHydrology};
pub use spatial_index::BoundingBox;
pub use volume::PrismVolume;
