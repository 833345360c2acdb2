// apps/hl_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示版本、支持的交换类型和聚合策略。

use anyhow::Result;
use clap::Args;
use hl_exchange::ExchangeKind;
use hl_mapping::ReductionPolicy;
use tracing::info;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 只显示交换类型
    #[arg(long)]
    pub exchanges: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== HydroLink 信息 ===");

    if !args.exchanges {
        print_system_info();
        println!();
    }
    print_exchanges();
    Ok(())
}

fn print_system_info() {
    println!("=== 系统信息 ===");
    println!("HydroLink CLI 版本: {}", env!("CARGO_PKG_VERSION"));
    println!("目标平台: {}", std::env::consts::ARCH);
    println!("操作系统: {}", std::env::consts::OS);

    println!("\n聚合策略:");
    for policy in [ReductionPolicy::Sum, ReductionPolicy::Average, ReductionPolicy::Weight] {
        let note = if policy.requires_weights() {
            "需要每条记录的权重"
        } else {
            ""
        };
        println!("  - {policy:<8} {note}");
    }
}

fn print_exchanges() {
    println!("=== 交换类型 ===");
    println!("{:<30} {:<14} {}", "exchange", "group", "policy");
    for kind in ExchangeKind::ALL {
        println!("{:<30} {:<14} {}", kind.name(), kind.group(), kind.policy_label());
    }
}
