// crates/hl_exchange/src/cycle.rs

//! 通量校正步进
//!
//! 一个耦合步内，一对正向/反向通量通道按固定顺序执行：
//!
//! ```text
//! Init ─map_forward─> ForwardMapped ─record_realized─> DownstreamSolved
//!      ─compute_correction─> CorrectionComputed ─redistribute_backward─> BackwardRedistributed
//!      ─map_forward─> ForwardMapped ...
//! ```
//!
//! 乱序调用返回 `HlError::InvalidPhase`。每步恰好一次校正。
//! 第 n 步的正向需求在反向分配后成为第 n+1 步反向通道的历史通量。

use std::fmt;

use hl_foundation::{HlError, HlResult};
use hl_mapping::{compute_correction, Mapping};
use tracing::{debug, trace};

use crate::reverse::ReverseChannel;

/// 步进阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// 尚未开始
    Init,
    /// 上游需求已映射到下游
    ForwardMapped,
    /// 下游实现量已记录
    DownstreamSolved,
    /// 校正项已计算
    CorrectionComputed,
    /// 下游值已分配回上游
    BackwardRedistributed,
}

impl CyclePhase {
    /// 阶段名称
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ForwardMapped => "forward_mapped",
            Self::DownstreamSolved => "downstream_solved",
            Self::CorrectionComputed => "correction_computed",
            Self::BackwardRedistributed => "backward_redistributed",
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 一对通量通道的步进状态机
#[derive(Debug, Clone)]
pub struct FluxCorrectionCycle {
    forward: Mapping,
    reverse: ReverseChannel,
    phase: CyclePhase,
    step: u64,
    demand_upstream: Vec<f64>,
    demand_downstream: Vec<f64>,
    realized_downstream: Vec<f64>,
    correction: Vec<f64>,
}

impl FluxCorrectionCycle {
    /// 由正向 SUM 映射和对应的反向通道创建
    pub fn new(forward: Mapping, reverse: ReverseChannel) -> HlResult<Self> {
        let reverse_mapping = reverse.mapping();
        HlError::check_size(
            "reverse target_size",
            forward.source_size(),
            reverse_mapping.target_size(),
        )?;
        HlError::check_size(
            "reverse source_size",
            forward.target_size(),
            reverse_mapping.source_size(),
        )?;

        let n_up = forward.source_size();
        let n_down = forward.target_size();
        Ok(Self {
            forward,
            reverse,
            phase: CyclePhase::Init,
            step: 0,
            demand_upstream: vec![0.0; n_up],
            demand_downstream: vec![0.0; n_down],
            realized_downstream: vec![0.0; n_down],
            correction: vec![0.0; n_up],
        })
    }

    /// 当前阶段
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// 已完成的步数
    pub fn step(&self) -> u64 {
        self.step
    }

    /// 正向映射
    pub fn forward(&self) -> &Mapping {
        &self.forward
    }

    /// 反向通道
    pub fn reverse(&self) -> &ReverseChannel {
        &self.reverse
    }

    /// 本步下游需求 `operator · demand_upstream`
    pub fn demand_downstream(&self) -> &[f64] {
        &self.demand_downstream
    }

    /// 最近一次计算的校正项
    pub fn correction(&self) -> &[f64] {
        &self.correction
    }

    fn require_phase(&self, allowed: &[CyclePhase], expected: &'static str) -> HlResult<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(HlError::InvalidPhase {
                expected,
                actual: self.phase.as_str(),
            })
        }
    }

    /// 把上游需求映射到下游
    ///
    /// 返回 `mask ⊙ previous_downstream + operator · demand_upstream`，
    /// 供下游内核作为本步输入。
    pub fn map_forward(
        &mut self,
        demand_upstream: &[f64],
        previous_downstream: &[f64],
    ) -> HlResult<Vec<f64>> {
        self.require_phase(
            &[CyclePhase::Init, CyclePhase::BackwardRedistributed],
            "init | backward_redistributed",
        )?;
        let next = self.forward.apply(previous_downstream, demand_upstream)?;

        self.demand_upstream.copy_from_slice(demand_upstream);
        self.forward
            .operator()
            .mul_vec(&self.demand_upstream, &mut self.demand_downstream);
        self.phase = CyclePhase::ForwardMapped;
        trace!(step = self.step, "forward mapped");
        Ok(next)
    }

    /// 记录下游实际实现量
    pub fn record_realized(&mut self, realized_downstream: &[f64]) -> HlResult<()> {
        self.require_phase(&[CyclePhase::ForwardMapped], CyclePhase::ForwardMapped.as_str())?;
        HlError::check_size(
            "realized_downstream",
            self.realized_downstream.len(),
            realized_downstream.len(),
        )?;
        self.realized_downstream.copy_from_slice(realized_downstream);
        self.phase = CyclePhase::DownstreamSolved;
        Ok(())
    }

    /// 计算上游未实现量
    pub fn compute_correction(&mut self) -> HlResult<&[f64]> {
        self.require_phase(&[CyclePhase::DownstreamSolved], CyclePhase::DownstreamSolved.as_str())?;
        self.correction = compute_correction(
            self.forward.operator(),
            &self.demand_upstream,
            &self.demand_downstream,
            &self.realized_downstream,
        )?;
        self.phase = CyclePhase::CorrectionComputed;
        Ok(self.correction.as_slice())
    }

    /// 把下游值分配回上游，并以本步正向需求更新反向权重
    ///
    /// 冷启动步返回 `None`（反向交换推迟）。
    pub fn redistribute_backward(
        &mut self,
        downstream_values: &[f64],
        previous_upstream: &[f64],
    ) -> HlResult<Option<Vec<f64>>> {
        self.require_phase(
            &[CyclePhase::CorrectionComputed],
            CyclePhase::CorrectionComputed.as_str(),
        )?;
        let out = self.reverse.exchange(previous_upstream, downstream_values)?;
        self.reverse.update_from_flux(&self.demand_upstream)?;

        self.phase = CyclePhase::BackwardRedistributed;
        self.step += 1;
        debug!(
            exchange = %self.reverse.kind(),
            step = self.step,
            deferred = out.is_none(),
            "coupling step completed"
        );
        Ok(out)
    }
}
