// crates/hl_mapping/src/builder.rs

//! 映射构建器
//!
//! 根据连接记录 `(source_idx[i], target_idx[i], weight[i]?)` 构建一个
//! `target_size × source_size` 的稀疏算子和一个长度为 `target_size` 的掩码。
//!
//! 编排层每步按下式应用映射：
//!
//! ```text
//! next = mask ⊙ previous + operator · input
//! ```
//!
//! 没有任何记录指向的目标单元 `mask = 1`，保留上一步的值而不是被清零。
//!
//! # 使用示例
//!
//! ```
//! use hl_mapping::{build_mapping, ReductionPolicy};
//!
//! // 3 个源，目标 1 接收两个源的平均值，目标 2 无连接
//! let mapping = build_mapping(&[0, 1, 2], &[0, 1, 1], 3, 3, ReductionPolicy::Average, None)?;
//! assert_eq!(mapping.mask(), &[0.0, 0.0, 1.0]);
//!
//! let next = mapping.apply(&[9.0, 9.0, 9.0], &[1.0, 2.0, 4.0])?;
//! assert_eq!(next, vec![1.0, 3.0, 9.0]);
//! # Ok::<(), hl_foundation::HlError>(())
//! ```

use hl_foundation::{HlError, HlResult};
use hl_sparse::{CsrBuilder, CsrMatrix};
use tracing::debug;

use crate::policy::ReductionPolicy;

/// 交换映射：稀疏算子 + 掩码
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    operator: CsrMatrix,
    mask: Vec<f64>,
}

impl Mapping {
    /// 由算子直接派生掩码
    ///
    /// 没有存储元素的行视为未映射。
    pub fn from_operator(operator: CsrMatrix) -> Self {
        let mask = (0..operator.n_rows())
            .map(|t| if operator.is_row_empty(t) { 1.0 } else { 0.0 })
            .collect();
        Self { operator, mask }
    }

    /// 稀疏算子
    #[inline]
    pub fn operator(&self) -> &CsrMatrix {
        &self.operator
    }

    /// 掩码（0.0 / 1.0）
    #[inline]
    pub fn mask(&self) -> &[f64] {
        &self.mask
    }

    /// 源系统大小（算子列数）
    #[inline]
    pub fn source_size(&self) -> usize {
        self.operator.n_cols()
    }

    /// 目标系统大小（算子行数）
    #[inline]
    pub fn target_size(&self) -> usize {
        self.operator.n_rows()
    }

    /// 未被任何记录指向的目标数量
    pub fn unmapped_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m != 0.0).count()
    }

    /// 目标 t 是否未映射
    #[inline]
    pub fn is_unmapped(&self, target: usize) -> bool {
        self.mask[target] != 0.0
    }

    /// 算子隐含的连接记录 `(target, source, value)`，按行主序
    pub fn records(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.operator.iter()
    }

    /// 应用映射：`next = mask ⊙ previous + operator · input`
    pub fn apply(&self, previous: &[f64], input: &[f64]) -> HlResult<Vec<f64>> {
        let mut out = vec![0.0; self.target_size()];
        self.apply_into(previous, input, &mut out)?;
        Ok(out)
    }

    /// 应用映射并写入 `out`
    pub fn apply_into(&self, previous: &[f64], input: &[f64], out: &mut [f64]) -> HlResult<()> {
        HlError::check_size("previous", self.target_size(), previous.len())?;
        HlError::check_size("input", self.source_size(), input.len())?;
        HlError::check_size("out", self.target_size(), out.len())?;

        #[cfg(feature = "parallel")]
        {
            self.operator.mul_vec_parallel(input, out);
            for ((o, &m), &p) in out.iter_mut().zip(&self.mask).zip(previous) {
                *o += m * p;
            }
        }
        #[cfg(not(feature = "parallel"))]
        {
            hl_sparse::hadamard(&self.mask, previous, out);
            self.operator.mul_vec_add(1.0, input, out);
        }
        Ok(())
    }

    /// 左乘对角项：`operator ← diag(term) · operator`
    ///
    /// 掩码不变。
    pub fn scale_rows(&mut self, term: &[f64]) -> HlResult<()> {
        HlError::check_size("conversion term", self.target_size(), term.len())?;
        self.operator.scale_rows(term);
        Ok(())
    }

    /// 拆分为 (算子, 掩码)
    pub fn into_parts(self) -> (CsrMatrix, Vec<f64>) {
        (self.operator, self.mask)
    }
}

/// 构建交换映射
///
/// # 参数
///
/// - `source_idx` / `target_idx`: 连接记录的源、目标索引（零基，等长）
/// - `source_size` / `target_size`: 两个系统的单元数
/// - `policy`: 聚合策略
/// - `weights`: 每条记录的权重，仅 `Weight` 策略使用
///
/// # 语义
///
/// 重复的 (source, target) 记录先累加：
/// - `Sum`: 每条记录贡献 1.0
/// - `Average`: 累加后第 t 行除以指向 t 的记录数
/// - `Weight`: 每条记录贡献 `weights[i]`，不归一
///
/// # 错误
///
/// 任何前置条件不满足时返回配置类错误，不会返回部分构建的算子。
pub fn build_mapping(
    source_idx: &[usize],
    target_idx: &[usize],
    source_size: usize,
    target_size: usize,
    policy: ReductionPolicy,
    weights: Option<&[f64]>,
) -> HlResult<Mapping> {
    HlError::check_size("target_idx", source_idx.len(), target_idx.len())?;
    for (&s, &t) in source_idx.iter().zip(target_idx) {
        HlError::check_index("source", s, source_size)?;
        HlError::check_index("target", t, target_size)?;
    }

    let record_weights = match policy {
        ReductionPolicy::Weight => {
            let w = weights.ok_or(HlError::MissingWeights)?;
            HlError::check_size("weights", source_idx.len(), w.len())?;
            Some(w)
        }
        ReductionPolicy::Sum | ReductionPolicy::Average => None,
    };

    let mut builder = CsrBuilder::new(target_size, source_size);
    let mut counts = vec![0usize; target_size];
    for (i, (&s, &t)) in source_idx.iter().zip(target_idx).enumerate() {
        let value = record_weights.map_or(1.0, |w| w[i]);
        builder.add(t, s, value);
        counts[t] += 1;
    }

    if policy == ReductionPolicy::Average {
        for (t, &n) in counts.iter().enumerate() {
            if n > 1 {
                builder.scale_row(t, 1.0 / n as f64);
            }
        }
    }

    let mask: Vec<f64> = counts
        .iter()
        .map(|&n| if n == 0 { 1.0 } else { 0.0 })
        .collect();
    let operator = builder.build();

    debug!(
        policy = %policy,
        rows = target_size,
        cols = source_size,
        nnz = operator.nnz(),
        records = source_idx.len(),
        "built exchange operator"
    );

    Ok(Mapping { operator, mask })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense(mapping: &Mapping) -> Vec<Vec<f64>> {
        mapping.operator().to_dense()
    }

    #[test]
    fn test_one_to_one_sum_is_identity() {
        let m = build_mapping(&[0, 1, 2], &[0, 1, 2], 3, 3, ReductionPolicy::Sum, None).unwrap();
        assert_eq!(m.operator(), &CsrMatrix::identity(3));
        assert_eq!(m.mask(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_one_to_one_average_is_identity() {
        let m = build_mapping(&[0, 1, 2], &[0, 1, 2], 3, 3, ReductionPolicy::Average, None)
            .unwrap();
        assert_eq!(m.operator(), &CsrMatrix::identity(3));
    }

    #[test]
    fn test_one_to_one_weight_is_diagonal() {
        let w = [0.5, 0.3, 0.1];
        let m = build_mapping(&[0, 1, 2], &[0, 1, 2], 3, 3, ReductionPolicy::Weight, Some(&w))
            .unwrap();
        assert_eq!(m.operator(), &CsrMatrix::diagonal(&w));
        assert_eq!(m.mask(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_asymmetric_one_to_one() {
        let m = build_mapping(&[0, 1, 2], &[2, 3, 4], 3, 6, ReductionPolicy::Sum, None).unwrap();
        assert_eq!(m.mask(), &[1.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(
            dense(&m),
            vec![
                vec![0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0],
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.0, 0.0],
            ]
        );
    }

    #[test]
    fn test_many_to_one_sum() {
        let m = build_mapping(&[0, 1, 2], &[0, 1, 1], 3, 3, ReductionPolicy::Sum, None).unwrap();
        assert_eq!(
            dense(&m),
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 1.0], vec![0.0, 0.0, 0.0]]
        );
        assert_eq!(m.mask(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_many_to_one_average() {
        let m = build_mapping(&[0, 1, 2], &[0, 1, 1], 3, 3, ReductionPolicy::Average, None)
            .unwrap();
        assert_eq!(dense(&m)[1], vec![0.0, 0.5, 0.5]);
        assert_eq!(m.mask(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_many_to_one_asymmetric_weight() {
        let w = [0.5, 0.3, 0.1];
        let m = build_mapping(&[0, 1, 2], &[2, 2, 4], 3, 6, ReductionPolicy::Weight, Some(&w))
            .unwrap();
        assert_eq!(dense(&m)[2], vec![0.5, 0.3, 0.0]);
        assert_eq!(dense(&m)[4], vec![0.0, 0.0, 0.1]);
        assert_eq!(m.mask(), &[1.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_duplicate_records_accumulate() {
        let m = build_mapping(&[1, 1, 0], &[0, 0, 0], 2, 1, ReductionPolicy::Sum, None).unwrap();
        assert_eq!(dense(&m), vec![vec![1.0, 2.0]]);

        // 平均按记录数归一：(1 + 2) / 3
        let m = build_mapping(&[1, 1, 0], &[0, 0, 0], 2, 1, ReductionPolicy::Average, None)
            .unwrap();
        let row = &dense(&m)[0];
        assert!((row[0] - 1.0 / 3.0).abs() < 1e-15);
        assert!((row[1] - 2.0 / 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_records_collapse_duplicate_pairs() {
        let m = build_mapping(&[1, 1, 0], &[0, 0, 0], 2, 1, ReductionPolicy::Sum, None).unwrap();
        let records: Vec<_> = m.records().collect();
        assert_eq!(records, vec![(0, 0, 1.0), (0, 1, 2.0)]);

        let m = build_mapping(&[0, 1, 2], &[2, 2, 0], 3, 3, ReductionPolicy::Average, None)
            .unwrap();
        let records: Vec<_> = m.records().collect();
        assert_eq!(records, vec![(0, 2, 1.0), (2, 0, 0.5), (2, 1, 0.5)]);
    }

    #[test]
    fn test_mask_matches_targets() {
        let src = [0, 3, 4, 4, 1];
        let tgt = [6, 0, 2, 6, 2];
        let m = build_mapping(&src, &tgt, 5, 8, ReductionPolicy::Sum, None).unwrap();
        for t in 0..8 {
            assert_eq!(m.is_unmapped(t), !tgt.contains(&t), "目标 {t}");
        }
        assert_eq!(m.unmapped_count(), 5);
    }

    #[test]
    fn test_zero_weight_record_still_maps_target() {
        let m = build_mapping(&[0], &[1], 1, 2, ReductionPolicy::Weight, Some(&[0.0])).unwrap();
        assert_eq!(m.mask(), &[1.0, 0.0]);
    }

    #[test]
    fn test_build_is_bitwise_deterministic() {
        let src = [2, 0, 1, 2, 0];
        let tgt = [0, 1, 1, 0, 3];
        let a = build_mapping(&src, &tgt, 3, 4, ReductionPolicy::Average, None).unwrap();
        let b = build_mapping(&src, &tgt, 3, 4, ReductionPolicy::Average, None).unwrap();
        assert_eq!(a.operator().row_ptr(), b.operator().row_ptr());
        assert_eq!(a.operator().col_idx(), b.operator().col_idx());
        let bits = |m: &Mapping| -> Vec<u64> {
            m.operator().values().iter().map(|v| v.to_bits()).collect()
        };
        assert_eq!(bits(&a), bits(&b));
        assert_eq!(a.mask(), b.mask());
    }

    #[test]
    fn test_zero_records() {
        let m = build_mapping(&[], &[], 4, 3, ReductionPolicy::Sum, None).unwrap();
        assert_eq!(m.target_size(), 3);
        assert_eq!(m.source_size(), 4);
        assert_eq!(m.operator().nnz(), 0);
        assert_eq!(m.mask(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_weights_ignored_without_weight_policy() {
        let w = [7.0, 9.0];
        let sum = build_mapping(&[0, 1], &[0, 0], 2, 1, ReductionPolicy::Sum, Some(&w)).unwrap();
        assert_eq!(dense(&sum), vec![vec![1.0, 1.0]]);
        let avg =
            build_mapping(&[0, 1], &[0, 0], 2, 1, ReductionPolicy::Average, Some(&w[..1])).unwrap();
        assert_eq!(dense(&avg), vec![vec![0.5, 0.5]]);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let err = build_mapping(&[0, 1], &[0], 2, 2, ReductionPolicy::Sum, None).unwrap_err();
        assert!(matches!(err, HlError::SizeMismatch { .. }));
    }

    #[test]
    fn test_out_of_bounds_index_is_rejected() {
        let err = build_mapping(&[0, 3], &[0, 1], 3, 2, ReductionPolicy::Sum, None).unwrap_err();
        assert!(matches!(
            err,
            HlError::IndexOutOfBounds { index_type: "source", index: 3, len: 3 }
        ));
        let err = build_mapping(&[0, 1], &[0, 2], 3, 2, ReductionPolicy::Sum, None).unwrap_err();
        assert!(matches!(err, HlError::IndexOutOfBounds { index_type: "target", .. }));
    }

    #[test]
    fn test_weight_policy_requires_matching_weights() {
        let err = build_mapping(&[0], &[0], 1, 1, ReductionPolicy::Weight, None).unwrap_err();
        assert!(matches!(err, HlError::MissingWeights));

        let err = build_mapping(&[0, 0], &[0, 0], 1, 1, ReductionPolicy::Weight, Some(&[1.0]))
            .unwrap_err();
        assert!(matches!(err, HlError::SizeMismatch { name: "weights", .. }));
    }

    #[test]
    fn test_apply_preserves_unmapped_targets() {
        let m = build_mapping(&[0, 1, 2], &[2, 2, 4], 3, 6, ReductionPolicy::Sum, None).unwrap();
        let previous = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let next = m.apply(&previous, &[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(next, vec![1.0, 2.0, 30.0, 4.0, 30.0, 6.0]);
    }

    #[test]
    fn test_apply_rejects_wrong_lengths() {
        let m = build_mapping(&[0], &[0], 1, 1, ReductionPolicy::Sum, None).unwrap();
        assert!(m.apply(&[0.0, 0.0], &[1.0]).is_err());
        assert!(m.apply(&[0.0], &[]).is_err());
    }

    #[test]
    fn test_scale_rows_keeps_mask() {
        let mut m = build_mapping(&[0, 1], &[0, 0], 2, 2, ReductionPolicy::Sum, None).unwrap();
        m.scale_rows(&[0.5, 4.0]).unwrap();
        assert_eq!(dense(&m), vec![vec![0.5, 0.5], vec![0.0, 0.0]]);
        assert_eq!(m.mask(), &[0.0, 1.0]);
        assert!(m.scale_rows(&[1.0]).is_err());
    }

    #[test]
    fn test_from_operator_derives_mask() {
        let original = build_mapping(&[0, 1], &[1, 1], 2, 3, ReductionPolicy::Sum, None).unwrap();
        let (operator, mask) = original.clone().into_parts();
        let rebuilt = Mapping::from_operator(operator);
        assert_eq!(rebuilt.mask(), mask.as_slice());
        assert_eq!(rebuilt, original);
    }
}
