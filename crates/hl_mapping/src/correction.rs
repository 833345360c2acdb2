// crates/hl_mapping/src/correction.rs

//! 通量校正
//!
//! 下游系统无法完全满足上游需求时，把未实现的部分按原始需求比例
//! 归还给每个上游贡献单元；反向通量按上一步的通量分布重新分配。
//!
//! # 算法
//!
//! - 通量权重：同一目标组内 `w[i] = q[i] / Σ_group q[j]`，组内权重和为 1
//! - 校正量：`α[t] = max(0, 1 - realized[t] / max(demand[t], ε))`，
//!   `corr[s] = demand_up[s] · Σ_t A[t,s] · α[t]`
//!
//! 每个耦合步只做一次校正，不迭代到收敛。

use std::collections::HashMap;

use hl_foundation::{HlError, HlResult, DEMAND_EPSILON};
use hl_sparse::{hadamard, CsrMatrix, KahanSum};
use tracing::warn;

use crate::builder::{build_mapping, Mapping};
use crate::policy::ReductionPolicy;

/// 由历史通量分布计算每条记录的再分配权重
///
/// 记录 i 属于目标组 `target_idx[i]`，权重为该记录通量占组内通量和的比例。
///
/// # 参数
///
/// - `target_idx`: 每条记录的分组键（正向映射的目标）
/// - `source_idx`: 每条记录的源索引，仅用于长度校验
/// - `previous_flux`: 每条记录上一步的通量
///
/// # 零通量组
///
/// 组内通量和为零时无法按比例分配，该组所有记录取等分权重 `1/n`，
/// 保持组内权重和为 1，并记录警告。
pub fn weight_from_flux(
    target_idx: &[usize],
    source_idx: &[usize],
    previous_flux: &[f64],
) -> HlResult<Vec<f64>> {
    HlError::check_size("source_idx", target_idx.len(), source_idx.len())?;
    HlError::check_size("previous_flux", target_idx.len(), previous_flux.len())?;

    let mut groups: HashMap<usize, (KahanSum, usize)> = HashMap::new();
    for (&t, &q) in target_idx.iter().zip(previous_flux) {
        let entry = groups.entry(t).or_default();
        entry.0.add(q);
        entry.1 += 1;
    }

    let mut zero_groups = 0usize;
    for (sum, _) in groups.values() {
        if sum.value().abs() < f64::MIN_POSITIVE {
            zero_groups += 1;
        }
    }
    if zero_groups > 0 {
        warn!(
            groups = zero_groups,
            "flux history sums to zero for some target groups, falling back to equal shares"
        );
    }

    let weights = target_idx
        .iter()
        .zip(previous_flux)
        .map(|(t, &q)| {
            let (sum, n) = &groups[t];
            let total = sum.value();
            if total.abs() < f64::MIN_POSITIVE {
                1.0 / *n as f64
            } else {
                q / total
            }
        })
        .collect();

    Ok(weights)
}

/// 计算上游未实现量（校正项）
///
/// # 参数
///
/// - `operator`: 上游 → 下游的未加权（SUM）算子，形状 `n_down × n_up`
/// - `demand_upstream`: 上游需求，长度 `n_up`
/// - `demand_downstream`: 下游需求（通常为 `operator · demand_upstream`），长度 `n_down`
/// - `realized_downstream`: 下游实际实现量，长度 `n_down`
///
/// # 返回
///
/// 上游每个单元未实现的量。实现量超过需求时校正为 0。
pub fn compute_correction(
    operator: &CsrMatrix,
    demand_upstream: &[f64],
    demand_downstream: &[f64],
    realized_downstream: &[f64],
) -> HlResult<Vec<f64>> {
    HlError::check_size("demand_upstream", operator.n_cols(), demand_upstream.len())?;
    HlError::check_size("demand_downstream", operator.n_rows(), demand_downstream.len())?;
    HlError::check_size("realized_downstream", operator.n_rows(), realized_downstream.len())?;

    let alpha: Vec<f64> = demand_downstream
        .iter()
        .zip(realized_downstream)
        .map(|(&demand, &realized)| (1.0 - realized / demand.max(DEMAND_EPSILON)).max(0.0))
        .collect();

    let mut alpha_up = vec![0.0; operator.n_cols()];
    operator.transpose_mul_vec(&alpha, &mut alpha_up);

    let mut correction = vec![0.0; operator.n_cols()];
    hadamard(&alpha_up, demand_upstream, &mut correction);
    Ok(correction)
}

/// 由历史通量构建加权反向映射
///
/// 记录按源索引分组（一个下游单元分配给多个上游单元），
/// `record_flux[i]` 是记录 i 上一步的正向通量。
pub fn build_reweighted_mapping(
    source_idx: &[usize],
    target_idx: &[usize],
    source_size: usize,
    target_size: usize,
    record_flux: &[f64],
) -> HlResult<Mapping> {
    let weights = weight_from_flux(source_idx, target_idx, record_flux)?;
    build_mapping(
        source_idx,
        target_idx,
        source_size,
        target_size,
        ReductionPolicy::Weight,
        Some(&weights),
    )
}

/// 按历史通量比例把源值再分配到目标
///
/// 记录取自 `operator` 的非零元 (t, s)；同一源 s 的记录按
/// `previous_flux[t]` 的比例分摊 `source_values[s]`。
///
/// # 参数
///
/// - `operator`: 下游 → 上游算子，形状 `n_target × n_source`
/// - `source_values`: 待分配的源值，长度 `n_source`
/// - `previous_flux`: 目标单元上一步的通量，长度 `n_target`
pub fn map_values_reweighted(
    operator: &CsrMatrix,
    source_values: &[f64],
    previous_flux: &[f64],
) -> HlResult<Vec<f64>> {
    HlError::check_size("source_values", operator.n_cols(), source_values.len())?;
    HlError::check_size("previous_flux", operator.n_rows(), previous_flux.len())?;

    let nnz = operator.nnz();
    let mut sources = Vec::with_capacity(nnz);
    let mut targets = Vec::with_capacity(nnz);
    let mut flux = Vec::with_capacity(nnz);
    for (t, s, _) in operator.iter() {
        sources.push(s);
        targets.push(t);
        flux.push(previous_flux[t]);
    }

    let mapping = build_reweighted_mapping(
        &sources,
        &targets,
        operator.n_cols(),
        operator.n_rows(),
        &flux,
    )?;

    let mut target_values = vec![0.0; operator.n_rows()];
    mapping.operator().mul_vec(source_values, &mut target_values);
    Ok(target_values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_foundation::tolerance::is_partition_of_unity;

    const EPS: f64 = 1e-12;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < EPS, "索引 {i}: {a} != {e}");
        }
    }

    #[test]
    fn test_weight_from_flux_partition() {
        let w = weight_from_flux(&[0, 0, 1, 1, 2], &[0, 1, 2, 3, 4], &[1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap();
        assert_close(&w, &[1.0 / 3.0, 2.0 / 3.0, 3.0 / 7.0, 4.0 / 7.0, 1.0]);

        assert!(is_partition_of_unity(&w[0..2]));
        assert!(is_partition_of_unity(&w[2..4]));
        assert!(is_partition_of_unity(&w[4..5]));
    }

    #[test]
    fn test_weight_from_flux_interleaved_groups() {
        let w = weight_from_flux(&[1, 0, 1, 0], &[0, 1, 2, 3], &[2.0, 1.0, 6.0, 3.0]).unwrap();
        assert_close(&w, &[0.25, 0.25, 0.75, 0.75]);
    }

    #[test]
    fn test_weight_from_flux_zero_group_gets_equal_shares() {
        let w = weight_from_flux(&[0, 0, 0, 1], &[0, 1, 2, 3], &[0.0, 0.0, 0.0, 2.0]).unwrap();
        assert_close(&w, &[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 1.0]);
        assert!(w.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_weight_from_flux_length_checks() {
        assert!(weight_from_flux(&[0, 0], &[0], &[1.0, 1.0]).is_err());
        assert!(weight_from_flux(&[0, 0], &[0, 1], &[1.0]).is_err());
    }

    #[test]
    fn test_compute_correction() {
        let demand_up = [1.0, 2.0, 3.0, 4.0, 5.0];
        let forward =
            build_mapping(&[0, 1, 2, 3, 4], &[0, 0, 1, 1, 2], 5, 3, ReductionPolicy::Sum, None)
                .unwrap();
        let mut demand_down = vec![0.0; 3];
        forward.operator().mul_vec(&demand_up, &mut demand_down);
        assert_eq!(demand_down, vec![3.0, 7.0, 5.0]);

        let realized: Vec<f64> = demand_down
            .iter()
            .zip([34.0, 73.0, 666.0])
            .map(|(d, short)| d - short)
            .collect();

        let corr =
            compute_correction(forward.operator(), &demand_up, &demand_down, &realized).unwrap();
        assert_close(
            &corr,
            &[
                34.0 / 3.0 * 1.0,
                34.0 / 3.0 * 2.0,
                73.0 / 7.0 * 3.0,
                73.0 / 7.0 * 4.0,
                666.0,
            ],
        );
    }

    #[test]
    fn test_compute_correction_overrealized_and_zero_demand() {
        let forward = build_mapping(&[0, 1], &[0, 1], 2, 2, ReductionPolicy::Sum, None).unwrap();
        // 目标 0 超额实现，目标 1 需求为零
        let corr =
            compute_correction(forward.operator(), &[2.0, 0.0], &[2.0, 0.0], &[3.0, 0.0]).unwrap();
        assert_eq!(corr, vec![0.0, 0.0]);
    }

    #[test]
    fn test_compute_correction_conserves_shortfall() {
        let src = [0, 1, 2, 3];
        let tgt = [0, 0, 0, 1];
        let forward = build_mapping(&src, &tgt, 4, 2, ReductionPolicy::Sum, None).unwrap();
        let demand_up = [2.0, 3.0, 5.0, 1.0];
        let demand_down = [10.0, 1.0];
        let realized = [6.0, 1.0];

        let corr =
            compute_correction(forward.operator(), &demand_up, &demand_down, &realized).unwrap();
        let shortfall: f64 = corr[0..3].iter().sum();
        assert!((shortfall - 4.0).abs() < EPS);
        assert!(corr[3].abs() < EPS);
    }

    #[test]
    fn test_compute_correction_length_checks() {
        let forward = build_mapping(&[0], &[0], 1, 1, ReductionPolicy::Sum, None).unwrap();
        assert!(compute_correction(forward.operator(), &[1.0, 1.0], &[1.0], &[1.0]).is_err());
        assert!(compute_correction(forward.operator(), &[1.0], &[1.0], &[]).is_err());
    }

    #[test]
    fn test_map_values_reweighted() {
        let reverse =
            build_mapping(&[0, 0, 1, 1, 2], &[0, 1, 2, 3, 4], 3, 5, ReductionPolicy::Sum, None)
                .unwrap();
        let values = map_values_reweighted(
            reverse.operator(),
            &[34.0, 73.0, 666.0],
            &[1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        assert_close(
            &values,
            &[
                34.0 / 3.0,
                34.0 * 2.0 / 3.0,
                73.0 * 3.0 / 7.0,
                73.0 * 4.0 / 7.0,
                666.0,
            ],
        );
    }

    #[test]
    fn test_map_values_reweighted_conserves_total() {
        let reverse =
            build_mapping(&[0, 0, 0, 1], &[0, 1, 2, 3], 2, 4, ReductionPolicy::Sum, None).unwrap();
        let source = [12.0, 5.0];
        let values = map_values_reweighted(reverse.operator(), &source, &[1.0, 1.0, 2.0, 9.0])
            .unwrap();
        let total: f64 = values.iter().sum();
        assert!((total - 17.0).abs() < EPS);
        assert_close(&values, &[3.0, 3.0, 6.0, 5.0]);
    }

    #[test]
    fn test_build_reweighted_mapping_rows() {
        // 下游 0 → 上游 {0, 1}，下游 1 → 上游 2
        let m = build_reweighted_mapping(&[0, 0, 1], &[0, 1, 2], 2, 3, &[3.0, 1.0, 7.0]).unwrap();
        assert_eq!(
            m.operator().to_dense(),
            vec![vec![0.75, 0.0], vec![0.25, 0.0], vec![0.0, 1.0]]
        );
        assert_eq!(m.mask(), &[0.0, 0.0, 0.0]);
    }
}
