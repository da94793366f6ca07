// crates/td_foundation/src/tolerance.rs

//! 数值容差配置
//!
//! 三角网上的几何判断（点重合、点在边上）与洼地充水迭代都依赖容差。
//! 容差通过参数注入，不使用全局变量。

use serde::{Deserialize, Serialize};

/// 几何容差
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTolerance {
    /// 点与点重合判断距离
    pub point: f64,
    /// 点到线判断距离
    pub line: f64,
    /// 面积/长度退化阈值
    pub degenerate: f64,
}

impl Default for GeoTolerance {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl GeoTolerance {
    /// 高精度容差
    pub const HIGH_PRECISION: Self = Self {
        point: 1e-9,
        line: 1e-9,
        degenerate: 1e-14,
    };

    /// 标准容差（默认）
    pub const STANDARD: Self = Self {
        point: 1e-6,
        line: 1e-6,
        degenerate: 1e-12,
    };

    /// 宽松容差（适用于粗糙测量数据）
    pub const RELAXED: Self = Self {
        point: 1e-3,
        line: 1e-3,
        degenerate: 1e-10,
    };

    /// 两点平面距离是否在重合容差内
    #[inline]
    pub fn is_same_point(&self, dx: f64, dy: f64) -> bool {
        dx * dx + dy * dy <= self.point * self.point
    }

    /// 数值是否可视为零
    #[inline]
    pub fn is_degenerate(&self, value: f64) -> bool {
        value.abs() <= self.degenerate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_standard() {
        assert_eq!(GeoTolerance::default(), GeoTolerance::STANDARD);
    }

    #[test]
    fn test_same_point() {
        let tol = GeoTolerance::STANDARD;
        assert!(tol.is_same_point(1e-7, 0.0));
        assert!(!tol.is_same_point(1e-3, 0.0));
        assert!(GeoTolerance::RELAXED.is_same_point(1e-4, 1e-4));
    }

    #[test]
    fn test_degenerate() {
        assert!(GeoTolerance::HIGH_PRECISION.is_degenerate(1e-15));
        assert!(!GeoTolerance::HIGH_PRECISION.is_degenerate(1e-6));
    }
}
