// apps/hl_cli/src/main.rs

//! HydroLink 命令行界面
//!
//! 在运行耦合模拟之前检查耦合拓扑：加载配置、查找表和全部连接文件，
//! 构建每个交换映射并报告结果。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// HydroLink 耦合拓扑工具
#[derive(Parser)]
#[command(name = "hl_cli")]
#[command(author = "HydroLink Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HydroLink exchange-mapping topology tool", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 验证耦合配置与连接文件
    Validate(commands::validate::ValidateArgs),
    /// 显示支持的交换类型
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

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    }
}
