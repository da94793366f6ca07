// apps/td_cli/src/commands/mod.rs

//! 子命令与共用的输入输出

pub mod fill;
pub mod info;
pub mod pond;
pub mod trace;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use td_drainage::TraceConfig;
use td_tin::{Tin, TinData};
use tracing::info;

/// 读取 JSON 三角网
pub fn load_tin(path: &Path) -> Result<Tin> {
    let text = fs::read_to_string(path).with_context(|| format!("无法读取三角网: {}", path.display()))?;
    let data = TinData::from_json_str(&text).with_context(|| format!("三角网解析失败: {}", path.display()))?;
    let tin = data.build().context("三角网构建失败")?;
    info!(points = data.points.len(), triangles = data.triangles.len(), "三角网已加载");
    Ok(tin)
}

/// 读取追踪配置，未给出时用默认值
pub fn load_config(path: Option<&Path>) -> Result<TraceConfig> {
    let Some(path) = path else {
        return Ok(TraceConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("无法读取配置: {}", path.display()))?;
    TraceConfig::from_json(&text).with_context(|| format!("配置无效: {}", path.display()))
}

/// 写出 JSON 结果；未给出路径时写到标准输出
pub fn write_output<T: Serialize>(output: Option<&PathBuf>, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("无法写入: {}", path.display()))?;
            info!("结果已写入 {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// 解析 `x,y` 坐标
pub fn parse_xy(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("坐标格式应为 x,y: {s}"))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("x 无效: {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("y 无效: {e}"))?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xy() {
        assert_eq!(parse_xy("1.5, -2").unwrap(), (1.5, -2.0));
        assert!(parse_xy("1.5").is_err());
        assert!(parse_xy("a,2").is_err());
    }

    #[test]
    fn test_default_config_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.minimum_pond_depth, 0.0);
    }
}
