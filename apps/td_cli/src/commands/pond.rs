// apps/td_cli/src/commands/pond.rs

//! 洼地分析命令
//!
//! 从低点（或平边）求满蓄边界、容量与出口；给出水量时再求该水量下的水位。

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use td_drainage::{PondAnalysis, PondExitInfo, PondKind, PondSeed};
use td_geo::Point3D;
use tracing::info;

use super::{load_config, load_tin, write_output};

/// 洼地分析参数
#[derive(Args)]
pub struct PondArgs {
    /// 三角网 JSON 文件
    #[arg(short, long)]
    pub tin: PathBuf,

    /// 追踪配置 JSON 文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 低点顶点编号
    #[arg(short, long, conflicts_with = "edge")]
    pub point: Option<u32>,

    /// 等高平边 `a,b`
    #[arg(short, long, value_delimiter = ',', num_args = 2)]
    pub edge: Vec<u32>,

    /// 蓄水量
    #[arg(short, long)]
    pub volume: Option<f64>,

    /// 输出文件（默认标准输出）
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct PondReport {
    kind: PondKind,
    low_point: u32,
    low_z: f64,
    exit_z: Option<f64>,
    capacity: Option<f64>,
    depth: f64,
    exits: Vec<PondExitInfo>,
    fill_z: Option<f64>,
    boundary: Vec<Vec<Point3D>>,
}

/// 执行洼地分析命令
pub fn execute(args: PondArgs) -> Result<()> {
    let seed = match (args.point, args.edge.as_slice()) {
        (Some(p), []) => PondSeed::Point(p),
        (None, &[a, b]) => PondSeed::Edge(a, b),
        _ => bail!("需要 --point 或 --edge 之一"),
    };

    let tin = load_tin(&args.tin)?;
    let config = load_config(args.config.as_deref())?;
    config.validate()?;

    let mut pond = PondAnalysis::new(&tin, seed)?;
    pond.find_pond(&tin)?;
    info!(
        low_point = pond.low_point(),
        exit_z = ?pond.exit_z(),
        capacity = ?pond.capacity(),
        "洼地求解完成"
    );

    let exit_z = pond.exit_z();
    let capacity = pond.capacity();
    let depth = pond.depth();
    let exits = pond.exits().to_vec();

    let fill_z = match args.volume {
        Some(volume) => pond.fill_to_volume(&tin, &config, volume)?,
        None => pond.fill_z(),
    };

    let report = PondReport {
        kind: pond.kind(),
        low_point: pond.low_point(),
        low_z: pond.low_z(),
        exit_z,
        capacity,
        depth,
        exits,
        fill_z,
        boundary: pond.boundary(&tin),
    };
    write_output(args.output.as_ref(), &report)
}
