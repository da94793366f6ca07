// crates/td_geo/src/error.rs

//! 几何内核错误类型

use td_foundation::TdError;
use thiserror::Error;

/// 几何模块结果类型
pub type GeoResult<T> = Result<T, GeoError>;

/// 几何错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// 退化三角形（共线或零面积）
    #[error("退化三角形: {operation}, 面积 {area:.3e}")]
    DegenerateTriangle {
        /// 失败的操作
        operation: &'static str,
        /// 平面面积
        area: f64,
    },

    /// 射线与线段不相交
    #[error("射线未与线段相交: {operation}")]
    NoIntersection {
        /// 失败的操作
        operation: &'static str,
    },

    /// 非有限坐标
    #[error("非有限坐标: {operation}")]
    NonFinite {
        /// 失败的操作
        operation: &'static str,
    },
}

impl GeoError {
    /// 退化三角形
    pub fn degenerate_triangle(operation: &'static str, area: f64) -> Self {
        Self::DegenerateTriangle { operation, area }
    }

    /// 不相交
    pub fn no_intersection(operation: &'static str) -> Self {
        Self::NoIntersection { operation }
    }
}

/// 转换到基础层错误
impl From<GeoError> for TdError {
    fn from(err: GeoError) -> Self {
        TdError::geometry(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_to_foundation() {
        let err = GeoError::degenerate_triangle("slope", 0.0);
        let base: TdError = err.into();
        assert!(matches!(base, TdError::Geometry(_)));
        assert!(base.to_string().contains("退化三角形"));
    }
}
