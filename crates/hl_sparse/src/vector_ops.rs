// crates/hl_sparse/src/vector_ops.rs

//! 向量运算
//!
//! 交换算子应用与守恒核算所需的少量逐元素运算。
//!
//! # 函数列表
//!
//! - [`hadamard`]: 逐元素乘法 z = x ⊙ y（掩码保留旧值）
//! - [`KahanSum`]: 补偿求和，用于质量总量核算

/// 逐元素乘法: z = x ⊙ y
///
/// # 参数
///
/// - `x`: 向量 x
/// - `y`: 向量 y
/// - `z`: 结果向量（将被覆盖）
#[inline]
pub fn hadamard(x: &[f64], y: &[f64], z: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), z.len());
    for ((zi, &xi), &yi) in z.iter_mut().zip(x.iter()).zip(y.iter()) {
        *zi = xi * yi;
    }
}

/// Kahan 补偿求和
///
/// 通量总量核算时减少累加误差。
///
/// # 示例
///
/// ```
/// use hl_sparse::vector_ops::KahanSum;
///
/// let total = KahanSum::sum_iter(vec![0.1; 1000]);
/// assert!((total - 100.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct KahanSum {
    sum: f64,
    compensation: f64,
}

impl KahanSum {
    /// 创建新的求和器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个值
    #[inline]
    pub fn add(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    /// 获取当前求和值
    #[inline]
    pub fn value(&self) -> f64 {
        self.sum
    }

    /// 从迭代器求和
    pub fn sum_iter<I: IntoIterator<Item = f64>>(iter: I) -> f64 {
        let mut kahan = Self::new();
        for v in iter {
            kahan.add(v);
        }
        kahan.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hadamard_masks_values() {
        let mask = [1.0, 0.0, 1.0];
        let previous = [4.0, 5.0, 6.0];
        let mut out = [0.0; 3];
        hadamard(&mask, &previous, &mut out);
        assert_eq!(out, [4.0, 0.0, 6.0]);
    }

    #[test]
    fn test_kahan_sum() {
        let total = KahanSum::sum_iter(std::iter::repeat(0.1).take(10_000));
        assert!((total - 1000.0).abs() < 1e-10);
    }
}
