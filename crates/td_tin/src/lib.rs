// crates/td_tin/src/lib.rs

//! 不规则三角网（TIN）
//!
//! 排水分析引擎读取地形的唯一入口。
//!
//! # 模块概览
//!
//! - [`traits`]: 只读访问接口 `TinAccess` 与拓扑约定
//! - [`tin`]: 内存三角网构建与 JSON 数据格式
//! - [`topology`]: CSR 邻接存储
//! - [`locator`]: 平面坐标到顶点/边/三角形的定位
//! - [`ascent`]: 高程取反视图（上溯追踪）
//! - [`generation`]: 规则格网与放射网生成
//!
//! # 设计原则
//!
//! 1. **只读**: 分析期间三角网不可变，修改通过修改戳通知缓存
//! 2. **逆时针**: 邻点环与凸包统一逆时针
//! 3. **接口隔离**: 分析引擎只依赖 `TinAccess`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ascent;
pub mod error;
pub mod generation;
pub mod locator;
pub mod tin;
pub mod topology;
pub mod traits;

// 重导出常用类型
pub use ascent::AscentView;
pub use error::{TinError, TinResult};
pub use generation::{grid_tin, radial_tin};
pub use locator::{Located, TinLocator};
pub use tin::{Tin, TinData};
pub use topology::CsrConnectivity;
pub use traits::TinAccess;

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::ascent::AscentView;
    pub use crate::error::{TinError, TinResult};
    pub use crate::locator::{Located, TinLocator};
    pub use crate::tin::{Tin, TinData};
    pub use crate::traits::TinAccess;
}
