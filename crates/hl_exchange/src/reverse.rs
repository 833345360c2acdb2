// crates/hl_exchange/src/reverse.rs

//! 反向通量通道
//!
//! 正向通量是 n:1 汇总（多个上游单元 → 一个下游节点），反向时下游节点的值
//! 要按上一步各上游单元的通量比例拆回去。连接拓扑只加载一次，
//! 权重每步由正向通量重建。
//!
//! 第一步没有历史通量：算子是普通的 SUM 映射，且反向交换推迟（冷启动）。

use hl_foundation::{HlError, HlResult};
use hl_io::Connectivity;
use hl_mapping::{build_mapping, build_reweighted_mapping, Mapping, ReductionPolicy};
use tracing::debug;

use crate::kind::ExchangeKind;

/// 反向通量通道
#[derive(Debug, Clone)]
pub struct ReverseChannel {
    kind: ExchangeKind,
    topology: Connectivity,
    source_size: usize,
    target_size: usize,
    mapping: Mapping,
    primed: bool,
}

impl ReverseChannel {
    /// 冷启动通道
    ///
    /// `topology` 已是反向记录：源为下游节点，目标为上游单元。
    pub fn cold(
        kind: ExchangeKind,
        topology: Connectivity,
        source_size: usize,
        target_size: usize,
    ) -> HlResult<Self> {
        let mapping = build_mapping(
            &topology.source_idx,
            &topology.target_idx,
            source_size,
            target_size,
            ReductionPolicy::Sum,
            None,
        )?;
        Ok(Self {
            kind,
            topology,
            source_size,
            target_size,
            mapping,
            primed: false,
        })
    }

    /// 交换类型
    pub fn kind(&self) -> ExchangeKind {
        self.kind
    }

    /// 当前映射
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// 静态拓扑
    pub fn topology(&self) -> &Connectivity {
        &self.topology
    }

    /// 是否已有历史通量权重
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// 用上一步的正向通量重建权重
    ///
    /// `upstream_flux` 按上游单元索引，长度为通道的目标规模。
    /// 每条记录的通量取其上游单元的通量，按下游节点分组归一。
    pub fn update_from_flux(&mut self, upstream_flux: &[f64]) -> HlResult<()> {
        HlError::check_size("upstream_flux", self.target_size, upstream_flux.len())?;

        let record_flux: Vec<f64> = self
            .topology
            .target_idx
            .iter()
            .map(|&t| upstream_flux[t])
            .collect();

        self.mapping = build_reweighted_mapping(
            &self.topology.source_idx,
            &self.topology.target_idx,
            self.source_size,
            self.target_size,
            &record_flux,
        )?;
        self.primed = true;

        debug!(exchange = %self.kind, records = record_flux.len(), "reverse weights rebuilt");
        Ok(())
    }

    /// 执行反向交换
    ///
    /// 冷启动时返回 `None`，调用方保留上游原值。
    pub fn exchange(&self, previous: &[f64], input: &[f64]) -> HlResult<Option<Vec<f64>>> {
        if !self.primed {
            debug!(exchange = %self.kind, "reverse exchange deferred at cold start");
            return Ok(None);
        }
        self.mapping.apply(previous, input).map(Some)
    }
}
