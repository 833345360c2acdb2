// crates/hl_exchange/src/kind.rs

//! 交换类型
//!
//! 每个交换类型对应一个物理量在两个系统之间的一个传递方向，
//! 它决定了所用的聚合策略。

use std::fmt;

use hl_mapping::ReductionPolicy;
use serde::{Deserialize, Serialize};

/// 交换类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeKind {
    /// MSW 储量 → MF6
    MswToMfStorage,
    /// MF6 水头 → MSW
    MfToMswHead,
    /// MSW 补给 → MF6 RCH
    MswToMfRecharge,
    /// MSW 灌溉 → MF6 井
    MswToMfSprinkling,

    /// MF6 RIV1 → DFM-1D 通量
    RiverToDflow1dFlux,
    /// DFM-1D 通量 → MF6 RIV1
    Dflow1dToRiverFlux,
    /// DFM-1D 水位 → MF6 RIV1
    Dflow1dToRiverStage,

    /// MF6 RIV2 → DFM-1D 通量（被动）
    PassiveRiverToDflow1dFlux,
    /// MF6 DRN → DFM-1D 通量
    DrainageToDflow1dFlux,

    /// MSW 地表水灌溉需求 → DFM-1D
    MswSprinklingToDflow1dFlux,
    /// DFM-1D 实现量 → MSW 地表水灌溉
    Dflow1dToMswSprinklingFlux,
    /// MSW 积水径流 → DFM-1D
    MswPondingToDflow1dFlux,

    /// MSW 积水 → DFM-2D
    MswPondingToDflow2dFlux,
    /// DFM-2D 通量 → MSW 积水
    Dflow2dToMswPondingFlux,
    /// DFM-2D 水位 → MSW 积水水位
    Dflow2dToMswPondingStage,
}

impl ExchangeKind {
    /// 全部交换类型
    pub const ALL: [ExchangeKind; 15] = [
        Self::MswToMfStorage,
        Self::MfToMswHead,
        Self::MswToMfRecharge,
        Self::MswToMfSprinkling,
        Self::RiverToDflow1dFlux,
        Self::Dflow1dToRiverFlux,
        Self::Dflow1dToRiverStage,
        Self::PassiveRiverToDflow1dFlux,
        Self::DrainageToDflow1dFlux,
        Self::MswSprinklingToDflow1dFlux,
        Self::Dflow1dToMswSprinklingFlux,
        Self::MswPondingToDflow1dFlux,
        Self::MswPondingToDflow2dFlux,
        Self::Dflow2dToMswPondingFlux,
        Self::Dflow2dToMswPondingStage,
    ];

    /// 交换名称（与耦合器日志和水量平衡输出中使用的名称一致）
    pub fn name(self) -> &'static str {
        match self {
            Self::MswToMfStorage => "msw2mf_storage",
            Self::MfToMswHead => "mf2msw_head",
            Self::MswToMfRecharge => "msw2mf_recharge",
            Self::MswToMfSprinkling => "msw2mf_sprinkling",
            Self::RiverToDflow1dFlux => "mf-riv2dflow1d_flux",
            Self::Dflow1dToRiverFlux => "dflow1d2mf-riv_flux",
            Self::Dflow1dToRiverStage => "dflow1d2mf-riv_stage",
            Self::PassiveRiverToDflow1dFlux => "mf-riv2dflow1d_flux",
            Self::DrainageToDflow1dFlux => "mf-drn2dflow1d_flux",
            Self::MswSprinklingToDflow1dFlux => "msw-sprinkling2dflow1d_flux",
            Self::Dflow1dToMswSprinklingFlux => "dflow1d_flux2msw-sprinkling",
            Self::MswPondingToDflow1dFlux => "msw-ponding2dflow1d_flux",
            Self::MswPondingToDflow2dFlux => "msw-ponding2dflow2d_flux",
            Self::Dflow2dToMswPondingFlux => "dflow2d_flux2msw-ponding",
            Self::Dflow2dToMswPondingStage => "dflow2d_stage2msw-ponding",
        }
    }

    /// 所属通道组
    pub fn group(self) -> &'static str {
        match self {
            Self::MswToMfStorage
            | Self::MfToMswHead
            | Self::MswToMfRecharge
            | Self::MswToMfSprinkling => "metamod",
            Self::RiverToDflow1dFlux | Self::Dflow1dToRiverFlux | Self::Dflow1dToRiverStage => {
                "active_river"
            }
            Self::PassiveRiverToDflow1dFlux | Self::DrainageToDflow1dFlux => "passive_river",
            Self::MswSprinklingToDflow1dFlux
            | Self::Dflow1dToMswSprinklingFlux
            | Self::MswPondingToDflow1dFlux => "msw_river",
            Self::MswPondingToDflow2dFlux
            | Self::Dflow2dToMswPondingFlux
            | Self::Dflow2dToMswPondingStage => "msw_surface",
        }
    }

    /// 算子的聚合策略
    ///
    /// 反向通量通道在有历史通量后使用 WEIGHT，冷启动时为 SUM。
    pub fn policy(self) -> ReductionPolicy {
        match self {
            Self::MfToMswHead => ReductionPolicy::Average,
            Self::Dflow1dToRiverStage
            | Self::Dflow2dToMswPondingStage
            | Self::Dflow1dToRiverFlux
            | Self::Dflow1dToMswSprinklingFlux
            | Self::Dflow2dToMswPondingFlux => ReductionPolicy::Weight,
            Self::MswToMfStorage
            | Self::MswToMfRecharge
            | Self::MswToMfSprinkling
            | Self::RiverToDflow1dFlux
            | Self::PassiveRiverToDflow1dFlux
            | Self::DrainageToDflow1dFlux
            | Self::MswSprinklingToDflow1dFlux
            | Self::MswPondingToDflow1dFlux
            | Self::MswPondingToDflow2dFlux => ReductionPolicy::Sum,
        }
    }

    /// 权重是否来自上一步的正向通量
    pub fn is_flux_history(self) -> bool {
        matches!(
            self,
            Self::Dflow1dToRiverFlux | Self::Dflow1dToMswSprinklingFlux | Self::Dflow2dToMswPondingFlux
        )
    }

    /// 是否左乘储量换算项
    pub fn is_converted(self) -> bool {
        matches!(self, Self::MswToMfStorage)
    }

    /// 策略的可读描述
    pub fn policy_label(self) -> &'static str {
        if self.is_converted() {
            "sum × conversion"
        } else if self.is_flux_history() {
            "weight (flux history, cold start: sum)"
        } else {
            match self.policy() {
                ReductionPolicy::Sum => "sum",
                ReductionPolicy::Average => "avg",
                ReductionPolicy::Weight => "weight (file)",
            }
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_unique_within_group() {
        for a in ExchangeKind::ALL {
            for b in ExchangeKind::ALL {
                if a != b && a.group() == b.group() {
                    assert_ne!(a.name(), b.name());
                }
            }
        }
    }

    #[test]
    fn test_policies() {
        assert_eq!(ExchangeKind::MfToMswHead.policy(), ReductionPolicy::Average);
        assert_eq!(ExchangeKind::MswToMfStorage.policy(), ReductionPolicy::Sum);
        assert!(ExchangeKind::MswToMfStorage.is_converted());
        assert!(ExchangeKind::Dflow1dToRiverFlux.is_flux_history());
        assert!(!ExchangeKind::Dflow1dToRiverStage.is_flux_history());
        assert_eq!(ExchangeKind::Dflow1dToRiverStage.policy_label(), "weight (file)");
    }

    #[test]
    fn test_serde_name() {
        let json = serde_json::to_string(&ExchangeKind::MswToMfStorage).unwrap();
        assert_eq!(json, "\"msw_to_mf_storage\"");
    }
}
