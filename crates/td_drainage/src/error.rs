// crates/td_drainage/src/error.rs
//! 排水分析错误类型
//!
//! 追踪与洼地分析中可能出现的拓扑、几何与逻辑错误。
//! 引擎内部一律返回 `DrainageResult`，由工作队列在特征边界处捕获，
//! 把出错的特征标记为失败，兄弟分支继续处理。

use td_foundation::TdError;
use td_geo::GeoError;
use td_tin::TinError;
use thiserror::Error;

/// 排水分析结果类型
pub type DrainageResult<T> = Result<T, DrainageError>;

/// 排水分析错误枚举
#[derive(Error, Debug)]
pub enum DrainageError {
    /// 配置无效
    #[error("配置无效: {message}")]
    InvalidConfig {
        /// 无效原因
        message: String,
    },

    /// 拓扑查询失败
    #[error("拓扑错误: {operation} 失败, {details}")]
    Topology {
        /// 操作名称
        operation: &'static str,
        /// 详细信息
        details: String,
    },

    /// 洼地种子为空或位于边界
    #[error("洼地种子无效: 低点 {low_point}, {reason}")]
    EmptySeed {
        /// 低点
        low_point: u32,
        /// 原因
        reason: &'static str,
    },

    /// 充水循环停滞
    #[error("充水循环停滞: 当前高程 {elevation} 等于下一最低高程")]
    Stuck {
        /// 当前水位
        elevation: f64,
    },

    /// 水位下降
    #[error("水位只能上升: 当前 {current}, 请求 {requested}")]
    ElevationBelowCurrent {
        /// 当前水位
        current: f64,
        /// 请求水位
        requested: f64,
    },

    /// 体积求解区间退化
    #[error("体积求解区间退化: 高程 [{low}, {high}], 体积 [{low_volume}, {high_volume}]")]
    DegenerateBracket {
        /// 区间下限高程
        low: f64,
        /// 区间上限高程
        high: f64,
        /// 下限体积
        low_volume: f64,
        /// 上限体积
        high_volume: f64,
    },

    /// 洼地出口未找到
    #[error("洼地出口未找到: 低点 {low_point}")]
    ExitNotFound {
        /// 低点
        low_point: u32,
    },

    /// 平坡追踪缺少上一个方向
    #[error("平坡追踪失败: 没有上一个下降方向")]
    NoLastAngle,

    /// 特征数超出上限
    #[error("特征数超出上限 {limit}")]
    FeatureLimit {
        /// 上限
        limit: usize,
    },

    /// 注水量无效
    #[error("注水量无效: {volume}")]
    InvalidVolume {
        /// 注水量
        volume: f64,
    },

    /// 起点位于空洞内
    #[error("起点位于空洞内: ({x}, {y})")]
    VoidStart {
        /// x 坐标
        x: f64,
        /// y 坐标
        y: f64,
    },

    /// 起点位于网格外
    #[error("起点位于网格外: ({x}, {y})")]
    OffMesh {
        /// x 坐标
        x: f64,
        /// y 坐标
        y: f64,
    },

    /// 三角网错误
    #[error("三角网错误: {0}")]
    Tin(#[from] TinError),

    /// 几何错误
    #[error("几何错误: {0}")]
    Geometry(#[from] GeoError),
}

/// 转换到基础层错误
impl From<DrainageError> for TdError {
    fn from(err: DrainageError) -> Self {
        match err {
            DrainageError::InvalidConfig { message } => TdError::config(message),
            DrainageError::Tin(tin) => tin.into(),
            DrainageError::Geometry(geo) => geo.into(),
            DrainageError::Topology { .. } => TdError::topology(err.to_string()),
            other => TdError::analysis(other.to_string()),
        }
    }
}

/// 便捷构造函数
impl DrainageError {
    /// 配置错误
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// 拓扑错误
    pub fn topology(operation: &'static str, details: impl Into<String>) -> Self {
        Self::Topology {
            operation,
            details: details.into(),
        }
    }

    /// 两点不相邻
    pub fn not_neighbours(operation: &'static str, p: u32, q: u32) -> Self {
        Self::topology(operation, format!("{p} 与 {q} 不相邻"))
    }

    /// 种子无效
    pub fn empty_seed(low_point: u32, reason: &'static str) -> Self {
        Self::EmptySeed { low_point, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_maps_to_foundation_config() {
        let base: TdError = DrainageError::invalid_config("体积容差为负").into();
        assert!(matches!(base, TdError::Config { .. }));
    }

    #[test]
    fn test_logic_errors_map_to_analysis() {
        let base: TdError = DrainageError::Stuck { elevation: 2.0 }.into();
        assert!(matches!(base, TdError::Analysis(_)));
        let base: TdError = DrainageError::not_neighbours("next_clk", 1, 2).into();
        assert!(matches!(base, TdError::Topology(_)));
    }

    #[test]
    fn test_display() {
        let err = DrainageError::VoidStart { x: 1.5, y: 2.0 };
        assert!(err.to_string().contains("空洞"));
        assert!(DrainageError::NoLastAngle.to_string().contains("方向"));
    }
}
