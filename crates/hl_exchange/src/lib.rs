// crates/hl_exchange/src/lib.rs

//! HydroLink 交换层
//!
//! 把配置声明的连接文件装配成各耦合通道的映射，并驱动每步的通量校正。
//!
//! # 模块概览
//!
//! - [`kind`]: 交换类型 `ExchangeKind` 及其策略
//! - [`set`]: 通道组的映射集合 `ExchangeSet`
//! - [`reverse`]: 反向通量通道（静态拓扑 + 每步权重）
//! - [`context`]: 查找表与系统规模
//! - [`assembly`]: 各通道组的装配函数
//! - [`cycle`]: 单步通量校正状态机
//!
//! # 使用示例
//!
//! ```no_run
//! use hl_config::CouplingConfig;
//! use hl_exchange::{assemble_coupling, ExchangeKind, SystemSizes};
//! use hl_io::TableCache;
//!
//! let config = CouplingConfig::from_file("coupling.json")?;
//! let cache = TableCache::new();
//! let exchanges = assemble_coupling(&config, None, &SystemSizes::default(), &cache)?;
//!
//! let stage = exchanges.apply(ExchangeKind::Dflow1dToRiverStage, &[0.0; 5], &[4.0, 5.0, 6.0])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembly;
pub mod context;
pub mod cycle;
pub mod kind;
pub mod reverse;
pub mod set;

pub use assembly::{
    assemble_active_river, assemble_coupling, assemble_metamod, assemble_msw_river,
    assemble_msw_surface, assemble_passive_river,
};
pub use context::{LookupSet, SystemSizes};
pub use cycle::{CyclePhase, FluxCorrectionCycle};
pub use kind::ExchangeKind;
pub use reverse::ReverseChannel;
pub use set::ExchangeSet;
