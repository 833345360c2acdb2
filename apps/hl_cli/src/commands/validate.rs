// apps/hl_cli/src/commands/validate.rs

//! 拓扑验证命令
//!
//! 加载耦合配置，按数据推导的规模装配全部通道组，输出每个交换的摘要。
//! 任何配置错误都使命令以非零状态退出；严格模式下未映射的目标单元也视为错误。

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use hl_config::CouplingConfig;
use hl_exchange::{assemble_coupling, ExchangeKind, ExchangeSet, SystemSizes};
use hl_io::TableCache;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 耦合配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,

    /// 输出格式
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// 摘要输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// 表格文本
    Text,
    /// JSON
    Json,
}

/// 单个交换的摘要
#[derive(Debug, Serialize)]
struct ExchangeSummary {
    kind: ExchangeKind,
    name: &'static str,
    group: &'static str,
    policy: &'static str,
    source_size: usize,
    target_size: usize,
    records: usize,
    unmapped: usize,
}

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn is_ok_strict(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== HydroLink 拓扑验证 ===");

    let config = CouplingConfig::from_file(&args.config)
        .with_context(|| format!("无法加载配置文件 {}", args.config.display()))?;

    let groups = config.declared_groups();
    if groups.is_empty() {
        warn!("配置中没有声明任何通道组");
    }

    let mut result = ValidationResult::default();
    let cache = TableCache::new();

    match assemble_coupling(&config, None, &SystemSizes::default(), &cache) {
        Ok(exchanges) => {
            let summaries = summarize(&exchanges);
            check_summaries(&config, &exchanges, &summaries, &mut result);
            match args.format {
                OutputFormat::Text => print_summaries(&summaries),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&summaries).context("无法序列化摘要")?
                ),
            }
        }
        Err(e) => result.add_error(e.to_string()),
    }

    print_validation_result(&result, args.strict, args.format)
}

fn summarize(exchanges: &ExchangeSet) -> Vec<ExchangeSummary> {
    exchanges
        .iter()
        .map(|(kind, mapping)| ExchangeSummary {
            kind,
            name: kind.name(),
            group: kind.group(),
            policy: kind.policy_label(),
            source_size: mapping.source_size(),
            target_size: mapping.target_size(),
            records: mapping.operator().nnz(),
            unmapped: mapping.unmapped_count(),
        })
        .collect()
}

fn check_summaries(
    config: &CouplingConfig,
    exchanges: &ExchangeSet,
    summaries: &[ExchangeSummary],
    result: &mut ValidationResult,
) {
    for s in summaries {
        if s.unmapped > 0 {
            result.add_warning(format!(
                "{} ({}): {} / {} 个目标单元没有连接",
                s.name, s.group, s.unmapped, s.target_size
            ));
        }
    }

    // 已声明但被跳过的可选通道
    if config.surface_enabled() && !exchanges.contains(ExchangeKind::MswPondingToDflow2dFlux) {
        result.add_warning("msw_surface 已启用但未装配（DFM-2D 点文件或连接文件缺失）");
    }
    if let Some(metamod) = &config.metamod {
        if metamod.enable_sprinkling && !exchanges.contains(ExchangeKind::MswToMfSprinkling) {
            result.add_warning("灌溉井已启用但连接文件缺失");
        }
        info!(exchange = %ExchangeKind::MswToMfStorage, "储量交换需要 MF6 单元几何，验证时不构建");
    }
}

fn print_summaries(summaries: &[ExchangeSummary]) {
    println!(
        "\n{:<30} {:<14} {:<40} {:>8} {:>8} {:>8} {:>8}",
        "exchange", "group", "policy", "source", "target", "records", "unmapped"
    );
    for s in summaries {
        println!(
            "{:<30} {:<14} {:<40} {:>8} {:>8} {:>8} {:>8}",
            s.name, s.group, s.policy, s.source_size, s.target_size, s.records, s.unmapped
        );
    }
}

fn print_validation_result(
    result: &ValidationResult,
    strict: bool,
    format: OutputFormat,
) -> Result<()> {
    // JSON 模式下 stdout 只输出摘要，诊断信息走日志
    let text = format == OutputFormat::Text;
    if text {
        println!("\n=== 验证结果 ===");
    }

    for e in &result.errors {
        error!("{e}");
        if text {
            println!("  ✗ {e}");
        }
    }
    for w in &result.warnings {
        warn!("{w}");
        if text {
            println!("  ⚠ {w}");
        }
    }

    let ok = if strict {
        result.is_ok_strict()
    } else {
        result.is_ok()
    };

    if ok {
        if text {
            println!("  ✓ 验证通过");
        }
        Ok(())
    } else if result.is_ok() {
        bail!("严格模式下存在 {} 个警告", result.warnings.len())
    } else {
        bail!("存在 {} 个错误", result.errors.len())
    }
}
