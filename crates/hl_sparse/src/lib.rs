// crates/hl_sparse/src/lib.rs

//! HydroLink 稀疏矩阵层
//!
//! 交换算子的底层存储：CSR 矩阵、构建器和少量向量运算。
//! 所有类型只使用 f64，构建后的矩阵不可变，可跨步复用。
//!
//! # 特性开关
//!
//! - `parallel`: 启用 `CsrMatrix::mul_vec_parallel`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod csr;
pub mod vector_ops;

pub use csr::{CsrBuilder, CsrMatrix, RowView};
pub use vector_ops::{hadamard, KahanSum};
