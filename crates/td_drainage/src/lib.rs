// crates/td_drainage/src/lib.rs

//! 三角网水流追踪与洼地分析引擎
//!
//! 从地表任意一点沿最速下降（或上升）方向追踪水流，遇到洼地时求出
//! 洼地的满蓄边界、容量与出口，并模拟注水后水量在洼地之间的再分配。
//!
//! # 模块概览
//!
//! - [`ring`]: 边界环（洼地在某一水位下的一条边界回路）
//! - [`pond`]: 洼地边界集：初始边界、按高程扩展、出口检测、体积与水位求解、水面多边形
//! - [`descent`]: 顶点处的最速下降方向与汇水线判断
//! - [`feature`]: 追踪特征图的节点
//! - [`analysis`]: 追踪引擎、充水模拟、结果输出与快照
//! - [`tables`]: 三角形水文属性与已知出口的查找表
//! - [`collector`]: 结果收集接口与水流线合并
//! - [`config`]: 追踪配置
//! - [`error`]: 错误类型
//!
//! # 设计原则
//!
//! 1. **三角网只读**: 引擎只通过 `TinAccess` 读取地形，不修改网格
//! 2. **Arena + 句柄**: 特征之间的引用都是 `FeatureId`，特征图可以安全深拷贝
//! 3. **错误不越界**: 单个特征失败只影响该分支，分析整体给出错误标记
//! 4. **查找表可选**: 查找表只是缓存，缺失或过期时直接计算
//!
//! # 示例
//!
//! ```
//! use td_drainage::prelude::*;
//! use td_tin::radial_tin;
//!
//! // 中心低 5 m 的六边形漏斗
//! let tin = radial_tin(6, 1, 1.0, |x, y| if x.hypot(y) < 0.5 { 0.0 } else { 5.0 }).unwrap();
//! let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
//! let summary = analysis.add_water_volume(0.3, 0.1, 1.0).unwrap();
//! assert!((summary.stored - 1.0).abs() < 1e-9);
//!
//! let mut buffer = ResultBuffer::new();
//! analysis.emit_results(&mut buffer);
//! assert_eq!(buffer.ponds.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod collector;
pub mod config;
pub mod descent;
pub mod error;
pub mod feature;
pub mod pond;
pub mod ring;
pub mod tables;

// 重导出常用类型
pub use analysis::{WaterAnalysis, WaterSummary};
pub use collector::{FeatureJoiner, LineKind, PointKind, PondResult, ResultBuffer, ResultCollector, TraceSink};
pub use config::{TraceConfig, TraceDirection, ZeroSlopeOption};
pub use error::{DrainageError, DrainageResult};
pub use feature::{Feature, FeatureCounts, FeatureId, FeatureKind};
pub use pond::{PondAnalysis, PondKind, PondSeed};
pub use ring::{BoundaryRing, PondExitInfo, RingLocation};
pub use tables::{DrainageTables, PondKey, TinSnapshot};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::analysis::{WaterAnalysis, WaterSummary};
    pub use crate::collector::{FeatureJoiner, LineKind, PointKind, PondResult, ResultBuffer, ResultCollector, TraceSink};
    pub use crate::config::{TraceConfig, TraceDirection, ZeroSlopeOption};
    pub use crate::error::{DrainageError, DrainageResult};
    pub use crate::feature::{FeatureId, FeatureKind};
    pub use crate::pond::{PondAnalysis, PondKind, PondSeed};
    pub use crate::tables::DrainageTables;
}
