// crates/hl_foundation/src/tolerance.rs

//! 数值容差常量
//!
//! 通量校正与权重计算中使用的阈值集中定义于此，
//! 避免在各模块中散落魔数。

/// 需求量下限
///
/// `compute_correction` 中计算实现比例 `realized / demand` 时，
/// 分母取 `max(demand, DEMAND_EPSILON)`。
pub const DEMAND_EPSILON: f64 = 1.0e-13;

/// 权重和校验容差
///
/// 同一目标组内的通量权重之和与 1 的最大允许偏差。
pub const WEIGHT_SUM_TOLERANCE: f64 = 1.0e-12;

/// 判断一组权重是否构成单位分解
#[inline]
pub fn is_partition_of_unity(weights: &[f64]) -> bool {
    (weights.iter().sum::<f64>() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_of_unity() {
        assert!(is_partition_of_unity(&[1.0 / 3.0, 2.0 / 3.0]));
        assert!(is_partition_of_unity(&[1.0]));
        assert!(!is_partition_of_unity(&[0.5, 0.4]));
    }
}
