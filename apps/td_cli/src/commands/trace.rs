// apps/td_cli/src/commands/trace.rs

//! 水流追踪命令
//!
//! 从一个或多个起点追踪，输出追踪视图：起点、追踪线、低点、满蓄洼地轮廓和出口。

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use td_drainage::{DrainageTables, ResultBuffer, TraceDirection, WaterAnalysis};
use tracing::{info, warn};

use super::{load_config, load_tin, parse_xy, write_output};

/// 水流追踪参数
#[derive(Args)]
pub struct TraceArgs {
    /// 三角网 JSON 文件
    #[arg(short, long)]
    pub tin: PathBuf,

    /// 追踪配置 JSON 文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 起点 `x,y`，可重复
    #[arg(short = 'a', long = "at", value_parser = parse_xy, required = true)]
    pub starts: Vec<(f64, f64)>,

    /// 上溯（沿最速上升方向追踪）
    #[arg(long)]
    pub ascent: bool,

    /// 预先构建查找表
    #[arg(long)]
    pub tables: bool,

    /// 输出文件（默认标准输出）
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// 执行追踪命令
pub fn execute(args: TraceArgs) -> Result<()> {
    let tin = load_tin(&args.tin)?;
    let mut config = load_config(args.config.as_deref())?;
    if args.ascent {
        config.direction = TraceDirection::Ascent;
    }

    let tables = args.tables.then(|| DrainageTables::build(&tin));
    let mut analysis = WaterAnalysis::new(&tin, config)?;
    if let Some(tables) = tables.as_ref() {
        analysis = analysis.with_tables(tables);
    }

    for &(x, y) in &args.starts {
        analysis.trace(x, y);
    }
    if let Some(message) = analysis.error_message() {
        warn!("追踪出错: {message}");
    }

    let counts = analysis.counts();
    info!(
        features = counts.features,
        ponds = counts.ponds,
        exits = counts.exits,
        "追踪完成"
    );

    let mut buffer = ResultBuffer::new();
    analysis.emit_trace(&mut buffer);
    write_output(args.output.as_ref(), &buffer)
}
