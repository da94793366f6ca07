// crates/td_tin/src/error.rs
//! 三角网错误类型
//!
//! 包含输入校验、拓扑构建与查询失败的错误定义，
//! 所有错误可转换为 `td_foundation::TdError` 向上传播

use td_foundation::TdError;
use td_geo::GeoError;
use thiserror::Error;

/// 三角网模块结果类型
pub type TinResult<T> = Result<T, TinError>;

/// 三角网错误枚举
#[derive(Error, Debug)]
pub enum TinError {
    /// 拓扑错误
    #[error("拓扑错误: {operation} 失败, {details}")]
    InvalidTopology {
        operation: &'static str,
        details: String,
    },

    /// 点索引越界
    #[error("点索引越界: {index} 超出范围 0..{len}")]
    PointOutOfRange { index: u32, len: usize },

    /// 非流形顶点（邻接扇区不连续）
    #[error("非流形顶点: 点 {point} 周围存在 {gaps} 个缺口")]
    NonManifold { point: u32, gaps: usize },

    /// 退化三角形
    #[error("退化三角形: [{a}, {b}, {c}]")]
    DegenerateTriangle { a: u32, b: u32, c: u32 },

    /// 两点不相邻
    #[error("两点不相邻: {p} - {q}")]
    NotNeighbours { p: u32, q: u32 },

    /// 格式错误
    #[error("三角网格式错误: {0}")]
    Format(String),

    /// 几何错误
    #[error("几何错误: {0}")]
    Geometry(#[from] GeoError),
}

/// 转换到基础层错误
impl From<TinError> for TdError {
    fn from(err: TinError) -> Self {
        match err {
            TinError::Format(message) => TdError::serialization(message),
            TinError::PointOutOfRange { index, len } => {
                TdError::index_out_of_bounds("Point", index as usize, len)
            }
            TinError::Geometry(geo) => geo.into(),
            other => TdError::topology(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for TinError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}

/// 便捷构造函数
impl TinError {
    pub fn invalid_topology(operation: &'static str, details: impl Into<String>) -> Self {
        Self::InvalidTopology {
            operation,
            details: details.into(),
        }
    }

    pub fn point_out_of_range(index: u32, len: usize) -> Self {
        Self::PointOutOfRange { index, len }
    }

    pub fn not_neighbours(p: u32, q: u32) -> Self {
        Self::NotNeighbours { p, q }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_to_foundation() {
        let err = TinError::invalid_topology("build", "重复三角形");
        let base: TdError = err.into();
        assert!(base.to_string().contains("拓扑错误"));
    }

    #[test]
    fn test_out_of_range_conversion() {
        let base: TdError = TinError::point_out_of_range(9, 3).into();
        assert!(matches!(base, TdError::IndexOutOfBounds { index: 9, len: 3, .. }));
    }

    #[test]
    fn test_display() {
        let err = TinError::not_neighbours(1, 7);
        assert!(err.to_string().contains("1 - 7"));
    }
}
