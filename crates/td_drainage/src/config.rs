// crates/td_drainage/src/config.rs

//! 追踪配置
//!
//! 所有参数都可以从 JSON 读取，缺省字段取默认值。

use serde::{Deserialize, Serialize};

use crate::error::{DrainageError, DrainageResult};

/// 追踪方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceDirection {
    /// 沿最速下降方向（默认）
    #[default]
    Descent,
    /// 沿最速上升方向
    Ascent,
}

/// 平坡处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroSlopeOption {
    /// 在平边/平三角形处生成洼地（默认）
    #[default]
    Pond,
    /// 沿上一个下降方向穿过平三角形
    TraceLastAngle,
}

/// 追踪配置
///
/// # 示例
///
/// ```
/// use td_drainage::config::TraceConfig;
///
/// let config = TraceConfig::from_json(r#"{ "minimum_pond_depth": 0.5 }"#).unwrap();
/// assert_eq!(config.minimum_pond_depth, 0.5);
/// assert_eq!(config.max_features, 100_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// 追踪方向
    #[serde(default)]
    pub direction: TraceDirection,

    /// 假低点深度：不超过此深度的洼地不会截断追踪
    #[serde(default)]
    pub minimum_pond_depth: f64,

    /// 平坡处理方式
    #[serde(default)]
    pub zero_slope: ZeroSlopeOption,

    /// 充水求解的高程容差
    #[serde(default = "default_elevation_tolerance")]
    pub elevation_tolerance: f64,

    /// 充水求解的体积容差
    #[serde(default = "default_volume_tolerance")]
    pub volume_tolerance: f64,

    /// 单次分析的特征数上限
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// 充水求解的最大迭代次数
    #[serde(default = "default_max_refine_iterations")]
    pub max_refine_iterations: usize,
}

// ========== 默认值函数 ==========

fn default_elevation_tolerance() -> f64 { 1e-6 }
fn default_volume_tolerance() -> f64 { 1e-6 }
fn default_max_features() -> usize { 100_000 }
fn default_max_refine_iterations() -> usize { 100 }

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            direction: TraceDirection::default(),
            minimum_pond_depth: 0.0,
            zero_slope: ZeroSlopeOption::default(),
            elevation_tolerance: default_elevation_tolerance(),
            volume_tolerance: default_volume_tolerance(),
            max_features: default_max_features(),
            max_refine_iterations: default_max_refine_iterations(),
        }
    }
}

impl TraceConfig {
    /// 高精度配置
    pub fn precise() -> Self {
        Self {
            elevation_tolerance: 1e-9,
            volume_tolerance: 1e-9,
            max_refine_iterations: 200,
            ..Default::default()
        }
    }

    /// 快速配置
    pub fn fast() -> Self {
        Self {
            elevation_tolerance: 1e-3,
            volume_tolerance: 1e-3,
            max_refine_iterations: 30,
            ..Default::default()
        }
    }

    /// 上溯配置
    pub fn ascent() -> Self {
        Self {
            direction: TraceDirection::Ascent,
            ..Default::default()
        }
    }

    /// 从 JSON 字符串解析并校验
    pub fn from_json(json: &str) -> DrainageResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| DrainageError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验参数
    pub fn validate(&self) -> DrainageResult<()> {
        if !(self.minimum_pond_depth >= 0.0) {
            return Err(DrainageError::invalid_config(format!(
                "假低点深度必须非负: {}",
                self.minimum_pond_depth
            )));
        }
        if !(self.elevation_tolerance > 0.0) {
            return Err(DrainageError::invalid_config(format!(
                "高程容差必须为正: {}",
                self.elevation_tolerance
            )));
        }
        if !(self.volume_tolerance > 0.0) {
            return Err(DrainageError::invalid_config(format!(
                "体积容差必须为正: {}",
                self.volume_tolerance
            )));
        }
        if self.max_features == 0 {
            return Err(DrainageError::invalid_config("特征数上限不能为 0"));
        }
        if self.max_refine_iterations == 0 {
            return Err(DrainageError::invalid_config("迭代次数上限不能为 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TraceConfig::default();
        assert_eq!(config.direction, TraceDirection::Descent);
        assert_eq!(config.zero_slope, ZeroSlopeOption::Pond);
        assert_eq!(config.max_refine_iterations, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(TraceConfig::precise().validate().is_ok());
        assert!(TraceConfig::fast().validate().is_ok());
        assert_eq!(TraceConfig::ascent().direction, TraceDirection::Ascent);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = TraceConfig {
            volume_tolerance: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DrainageError::InvalidConfig { .. })
        ));
        let config = TraceConfig {
            max_features: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_enums() {
        let config = TraceConfig::from_json(
            r#"{ "direction": "ascent", "zero_slope": "trace_last_angle" }"#,
        )
        .unwrap();
        assert_eq!(config.direction, TraceDirection::Ascent);
        assert_eq!(config.zero_slope, ZeroSlopeOption::TraceLastAngle);
        assert!(TraceConfig::from_json(r#"{ "elevation_tolerance": 0.0 }"#).is_err());
    }
}
