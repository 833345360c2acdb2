// crates/hl_foundation/src/lib.rs

//! HydroLink Foundation Layer
//!
//! 基础层，为耦合引擎的所有 crate 提供统一错误类型和数值容差。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `HlError` / `HlResult`
//! - [`tolerance`]: 数值容差常量
//!
//! # 层级架构
//!
//! ```text
//! Layer 4: hl_cli       ─> 拓扑验证命令行
//! Layer 3: hl_exchange  ─> 通道装配、反向通道、步进校正状态机
//! Layer 2: hl_mapping   ─> 映射构建、通量校正   | hl_io ─> 连接表/查找表 | hl_config
//! Layer 1: hl_sparse    ─> CSR 稀疏矩阵
//! Layer 0: hl_foundation（本层）
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod tolerance;

// 重导出常用类型
pub use error::{HlError, HlResult};
pub use tolerance::{DEMAND_EPSILON, WEIGHT_SUM_TOLERANCE};
