// crates/td_foundation/src/error.rs

//! 错误处理模块，定义基础层统一错误类型
//!
//! 提供 `TdError` 枚举和 `TdResult` 类型别名。几何、三角网、排水分析各层
//! 定义自己的错误类型，并通过 `From` 转换汇入 `TdError`。
//!
//! # 示例
//!
//! ```
//! use td_foundation::error::{TdError, TdResult};
//!
//! fn read_tin() -> TdResult<()> {
//!     Err(TdError::invalid_input("三角形索引越界"))
//! }
//! assert!(read_tin().is_err());
//! ```

use thiserror::Error;

/// 统一结果类型
pub type TdResult<T> = Result<T, TdError>;

/// 基础层错误类型
#[derive(Error, Debug)]
pub enum TdError {
    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    /// 拓扑错误
    #[error("拓扑错误: {0}")]
    Topology(String),

    /// 几何计算错误
    #[error("几何错误: {0}")]
    Geometry(String),

    /// 分析逻辑错误
    #[error("分析错误: {0}")]
    Analysis(String),

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 序列化失败原因
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl TdError {
    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 拓扑错误
    pub fn topology(message: impl Into<String>) -> Self {
        Self::Topology(message.into())
    }

    /// 几何错误
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry(message.into())
    }

    /// 分析逻辑错误
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis(message.into())
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TdError::config("容差为负");
        assert!(err.to_string().contains("配置错误"));
        assert!(err.to_string().contains("容差为负"));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let err = TdError::index_out_of_bounds("Point", 12, 4);
        let text = err.to_string();
        assert!(text.contains("Point"));
        assert!(text.contains("12"));
        assert!(text.contains('4'));
    }

    #[test]
    fn test_serialization_message() {
        let err = TdError::serialization("缺少 triangles 字段");
        assert!(matches!(err, TdError::Serialization { .. }));
        assert!(err.to_string().contains("triangles"));
    }
}
