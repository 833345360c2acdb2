// crates/hl_mapping/src/policy.rs

//! 聚合策略
//!
//! 多个源对同一目标的贡献如何合并。策略在算子构建时固定，
//! 同一算子内不混用。

use hl_foundation::{HlError, HlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 聚合策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReductionPolicy {
    /// 求和：每条记录贡献 1.0
    Sum,
    /// 平均：求和后按目标的记录数归一
    #[serde(alias = "avg")]
    Average,
    /// 加权：每条记录贡献给定权重，不归一
    Weight,
}

impl ReductionPolicy {
    /// 策略名称
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Average => "avg",
            Self::Weight => "weight",
        }
    }

    /// 是否需要权重数组
    #[inline]
    pub fn requires_weights(self) -> bool {
        matches!(self, Self::Weight)
    }
}

impl fmt::Display for ReductionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ReductionPolicy {
    type Err = HlError;

    fn from_str(s: &str) -> HlResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "avg" | "average" => Ok(Self::Average),
            "weight" => Ok(Self::Weight),
            other => Err(HlError::unknown_policy(other)),
        }
    }
}
