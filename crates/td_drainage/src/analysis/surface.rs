// crates/td_drainage/src/analysis/surface.rs

//! 分析面：下降模式直接使用三角网，上溯模式使用高程取反的视图

use td_foundation::GeoTolerance;
use td_geo::Point3D;
use td_tin::{AscentView, TinAccess};

use crate::config::TraceDirection;

/// 引擎实际追踪的面
#[derive(Debug)]
pub(crate) enum Surface<'a, M: TinAccess + ?Sized> {
    Descent(&'a M),
    Ascent(AscentView<'a, M>),
}

impl<M: TinAccess + ?Sized> Clone for Surface<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: TinAccess + ?Sized> Copy for Surface<'_, M> {}

impl<'a, M: TinAccess + ?Sized> Surface<'a, M> {
    pub(crate) fn new(tin: &'a M, direction: TraceDirection) -> Self {
        match direction {
            TraceDirection::Descent => Self::Descent(tin),
            TraceDirection::Ascent => Self::Ascent(AscentView::new(tin)),
        }
    }

    /// 把分析面上的点换回真实高程
    pub(crate) fn restore(&self, p: Point3D) -> Point3D {
        match self {
            Self::Descent(_) => p,
            Self::Ascent(_) => p.with_z(-p.z),
        }
    }
}

macro_rules! delegate {
    ($self:ident, $inner:ident => $e:expr) => {
        match $self {
            Surface::Descent($inner) => $e,
            Surface::Ascent($inner) => $e,
        }
    };
}

impl<M: TinAccess + ?Sized> TinAccess for Surface<'_, M> {
    fn n_points(&self) -> usize {
        delegate!(self, t => t.n_points())
    }

    fn n_triangles(&self) -> usize {
        delegate!(self, t => t.n_triangles())
    }

    fn point(&self, p: u32) -> Point3D {
        delegate!(self, t => t.point(p))
    }

    fn tolerance(&self) -> GeoTolerance {
        delegate!(self, t => t.tolerance())
    }

    fn stamp(&self) -> u64 {
        delegate!(self, t => t.stamp())
    }

    fn neighbours(&self, p: u32) -> &[u32] {
        delegate!(self, t => t.neighbours(p))
    }

    fn hull_next(&self, p: u32) -> Option<u32> {
        delegate!(self, t => t.hull_next(p))
    }

    fn hull_prev(&self, p: u32) -> Option<u32> {
        delegate!(self, t => t.hull_prev(p))
    }

    fn is_void_point(&self, p: u32) -> bool {
        delegate!(self, t => t.is_void_point(p))
    }

    fn is_void_triangle(&self, a: u32, b: u32, c: u32) -> bool {
        delegate!(self, t => t.is_void_triangle(a, b, c))
    }
}
