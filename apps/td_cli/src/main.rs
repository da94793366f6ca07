// apps/td_cli/src/main.rs

//! 地形排水分析命令行界面
//!
//! 读取 JSON 三角网，执行水流追踪、注水模拟和单个洼地分析，
//! 结果以 JSON 输出到文件或标准输出。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// 三角网水流追踪与洼地分析工具
#[derive(Parser)]
#[command(name = "td_cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "TIN water trace and pond analysis", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 从若干起点追踪水流
    Trace(commands::trace::TraceArgs),
    /// 注水并输出水量分布
    Fill(commands::fill::FillArgs),
    /// 分析单个洼地
    Pond(commands::pond::PondArgs),
    /// 显示三角网与配置信息
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // 日志写到 stderr，stdout 留给 JSON 结果
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Trace(args) => commands::trace::execute(args),
        Commands::Fill(args) => commands::fill::execute(args),
        Commands::Pond(args) => commands::pond::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    }
}
