// crates/td_tin/src/ascent.rs

//! 上溯视图：高程取反的三角网
//!
//! 沿最速上升方向追踪等价于在高程取反的地形上沿最速下降方向追踪，
//! 因此上溯模式只需把分析引擎包在这个视图上，输出时再把高程翻转回来。

use td_foundation::GeoTolerance;
use td_geo::Point3D;

use crate::traits::TinAccess;

/// 高程取反的只读视图
#[derive(Debug)]
pub struct AscentView<'a, M: TinAccess + ?Sized> {
    inner: &'a M,
}

// 只持有引用，不要求 M: Clone
impl<M: TinAccess + ?Sized> Clone for AscentView<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: TinAccess + ?Sized> Copy for AscentView<'_, M> {}

impl<'a, M: TinAccess + ?Sized> AscentView<'a, M> {
    /// 包装三角网
    pub fn new(inner: &'a M) -> Self {
        Self { inner }
    }

    /// 被包装的三角网
    pub fn inner(&self) -> &'a M {
        self.inner
    }
}

impl<M: TinAccess + ?Sized> TinAccess for AscentView<'_, M> {
    #[inline]
    fn n_points(&self) -> usize {
        self.inner.n_points()
    }

    #[inline]
    fn n_triangles(&self) -> usize {
        self.inner.n_triangles()
    }

    #[inline]
    fn point(&self, p: u32) -> Point3D {
        let pt = self.inner.point(p);
        pt.with_z(-pt.z)
    }

    #[inline]
    fn tolerance(&self) -> GeoTolerance {
        self.inner.tolerance()
    }

    #[inline]
    fn stamp(&self) -> u64 {
        // 与原网区分，避免两种视图共用缓存
        !self.inner.stamp()
    }

    #[inline]
    fn neighbours(&self, p: u32) -> &[u32] {
        self.inner.neighbours(p)
    }

    #[inline]
    fn hull_next(&self, p: u32) -> Option<u32> {
        self.inner.hull_next(p)
    }

    #[inline]
    fn hull_prev(&self, p: u32) -> Option<u32> {
        self.inner.hull_prev(p)
    }

    #[inline]
    fn is_void_point(&self, p: u32) -> bool {
        self.inner.is_void_point(p)
    }

    #[inline]
    fn is_void_triangle(&self, a: u32, b: u32, c: u32) -> bool {
        self.inner.is_void_triangle(a, b, c)
    }
}
