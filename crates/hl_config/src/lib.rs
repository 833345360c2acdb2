// crates/hl_config/src/lib.rs

//! HydroLink Config Layer
//!
//! 配置层，声明耦合拓扑：查找表与各通道组的连接文件。
//!
//! # 模块概览
//!
//! - [`coupling_config`]: CouplingConfig 耦合拓扑配置（JSON）
//! - [`error`]: 配置错误类型
//!
//! 配置作为显式参数传给装配层，不存在全局状态。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coupling_config;
pub mod error;

pub use coupling_config::{
    ActiveRiverConfig, CouplingConfig, LookupConfig, MetaModConfig, MswRiverConfig,
    MswSurfaceConfig, PassiveRiverConfig,
};
pub use error::ConfigError;
