// apps/td_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示三角网概况和追踪配置。

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use td_drainage::{DrainageTables, TraceConfig};
use td_tin::{Tin, TinAccess};
use tracing::info;

use super::{load_config, load_tin};

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 三角网 JSON 文件
    #[arg(short, long)]
    pub tin: Option<PathBuf>,

    /// 追踪配置 JSON 文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 显示默认配置
    #[arg(long)]
    pub defaults: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== 地形排水分析信息 ===");

    if let Some(path) = &args.tin {
        let tin = load_tin(path)?;
        print_tin_info(&tin);
    }

    if args.config.is_some() {
        let config = load_config(args.config.as_deref())?;
        print_config("配置", &config)?;
    }

    if args.defaults || (args.tin.is_none() && args.config.is_none()) {
        print_config("默认配置", &TraceConfig::default())?;
    }

    Ok(())
}

fn print_tin_info(tin: &Tin) {
    let n = tin.n_points() as u32;
    let (mut z_min, mut z_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let mut hull = 0usize;
    let mut boundary = 0usize;
    for p in 0..n {
        let z = tin.z(p);
        z_min = z_min.min(z);
        z_max = z_max.max(z);
        if tin.is_hull(p) {
            hull += 1;
        }
        if tin.is_boundary(p) {
            boundary += 1;
        }
    }
    let tables = DrainageTables::build(tin);

    println!("=== 三角网 ===");
    println!("顶点数: {}", tin.n_points());
    println!("三角形数: {}", tin.n_triangles());
    println!("查找表三角形数: {}", tables.n_triangles());
    println!("凸包顶点数: {hull}");
    println!("边界顶点数: {boundary}");
    if n > 0 {
        println!("高程范围: {z_min:.3} ~ {z_max:.3}");
    }
}

fn print_config(title: &str, config: &TraceConfig) -> Result<()> {
    println!("=== {title} ===");
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
