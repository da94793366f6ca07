// crates/td_foundation/src/lib.rs

//! 地形排水分析基础层
//!
//! 为上层几何内核、三角网访问与排水分析引擎提供基础抽象。
//!
//! # 模块概览
//!
//! - [`arena`]: 只追加 Arena、强类型句柄与句柄映射表
//! - [`error`]: 统一错误类型
//! - [`tolerance`]: 几何容差预设
//!
//! # 设计原则
//!
//! 1. **最小依赖**: 仅依赖 serde 和 thiserror
//! 2. **类型安全**: 编译期防止句柄误用
//! 3. **参数注入**: 容差随调用传递，不使用全局状态

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arena;
pub mod error;
pub mod tolerance;

// 重导出常用类型
pub use arena::{Arena, ArenaTag, HandleMap, Idx};
pub use error::{TdError, TdResult};
pub use tolerance::GeoTolerance;

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::arena::{Arena, ArenaTag, HandleMap, Idx};
    pub use crate::error::{TdError, TdResult};
    pub use crate::tolerance::GeoTolerance;
}
