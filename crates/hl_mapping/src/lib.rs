// crates/hl_mapping/src/lib.rs

//! HydroLink 映射层
//!
//! 在两个系统的编号之间构建可复用的线性交换算子，
//! 并在下游无法满足上游需求时计算守恒校正。
//!
//! # 模块概览
//!
//! - [`policy`]: 聚合策略 `ReductionPolicy`（SUM / AVERAGE / WEIGHT）
//! - [`builder`]: `build_mapping` 与 `Mapping`（算子 + 掩码）
//! - [`correction`]: 通量权重、校正项、按历史通量再分配
//! - [`conversion`]: 储量交换单位换算项
//!
//! 本层所有函数都是输入的纯函数，构建后的 `Mapping` 只读，可在多步间复用。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod conversion;
pub mod correction;
pub mod policy;

pub use builder::{build_mapping, Mapping};
pub use conversion::{storage_conversion_term, CellGeometry};
pub use correction::{
    build_reweighted_mapping, compute_correction, map_values_reweighted, weight_from_flux,
};
pub use policy::ReductionPolicy;
