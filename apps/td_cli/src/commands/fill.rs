// apps/td_cli/src/commands/fill.rs

//! 注水命令
//!
//! 依次在每个起点注入水量，输出水量汇总和充水视图。

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Args;
use serde::Serialize;
use td_drainage::{FeatureJoiner, ResultBuffer, WaterAnalysis, WaterSummary};
use tracing::{info, warn};

use super::{load_config, load_tin, parse_xy, write_output};

/// 注水参数
#[derive(Args)]
pub struct FillArgs {
    /// 三角网 JSON 文件
    #[arg(short, long)]
    pub tin: PathBuf,

    /// 追踪配置 JSON 文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 注水点 `x,y`，可重复
    #[arg(short = 'a', long = "at", value_parser = parse_xy, required = true)]
    pub starts: Vec<(f64, f64)>,

    /// 每个注水点的水量；只给一个时所有点共用
    #[arg(short, long, required = true)]
    pub volume: Vec<f64>,

    /// 合并首尾相接的水流线
    #[arg(long)]
    pub join: bool,

    /// 输出文件（默认标准输出）
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct FillReport {
    summary: WaterSummary,
    errored: bool,
    results: ResultBuffer,
}

/// 执行注水命令
pub fn execute(args: FillArgs) -> Result<()> {
    ensure!(
        args.volume.len() == 1 || args.volume.len() == args.starts.len(),
        "水量个数 ({}) 应为 1 或与注水点个数 ({}) 相同",
        args.volume.len(),
        args.starts.len()
    );

    let tin = load_tin(&args.tin)?;
    let config = load_config(args.config.as_deref())?;
    let mut analysis = WaterAnalysis::new(&tin, config)?;

    for (i, &(x, y)) in args.starts.iter().enumerate() {
        let volume = args.volume.get(i).copied().unwrap_or(args.volume[0]);
        analysis.add_water_volume(x, y, volume)?;
    }
    if let Some(message) = analysis.error_message() {
        warn!("充水过程出错: {message}");
    }

    let results = if args.join {
        let mut joiner = FeatureJoiner::new(ResultBuffer::new());
        analysis.emit_results(&mut joiner);
        info!(joined = joiner.joined(), "水流线已合并");
        joiner.finish()
    } else {
        let mut buffer = ResultBuffer::new();
        analysis.emit_results(&mut buffer);
        buffer
    };

    let report = FillReport {
        summary: analysis.water_summary(),
        errored: analysis.is_errored(),
        results,
    };
    write_output(args.output.as_ref(), &report)
}
