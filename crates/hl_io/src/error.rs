// crates/hl_io/src/error.rs
//! IO 错误类型定义
//!
//! 表格解析阶段的错误枚举。所有错误最终可转换为 `HlError`，
//! 由装配层统一向编排层报告。

use std::path::PathBuf;

use hl_foundation::HlError;
use thiserror::Error;

/// IO 模块结果类型别名
pub type IoResult<T> = Result<T, IoError>;

/// IO 错误枚举
#[derive(Error, Debug)]
pub enum IoError {
    /// 列数不足
    #[error("列数不足: {file}:{line} - 期望至少 {expected} 列, 实际 {actual} 列")]
    MissingColumn {
        /// 出错文件
        file: PathBuf,
        /// 一基物理行号
        line: usize,
        /// 布局要求的最少列数
        expected: usize,
        /// 该行实际列数
        actual: usize,
    },

    /// 数值解析失败
    #[error("数值解析失败: {file}:{line} - 第 {column} 列 '{token}'")]
    InvalidNumber {
        /// 出错文件
        file: PathBuf,
        /// 一基物理行号
        line: usize,
        /// 零基列号
        column: usize,
        /// 原始字段文本
        token: String,
    },

    /// 期望整数编号
    #[error("期望整数编号: {file}:{line} - 第 {column} 列值 {value}")]
    NotInteger {
        /// 出错文件
        file: PathBuf,
        /// 一基物理行号
        line: usize,
        /// 零基列号
        column: usize,
        /// 解析得到的数值
        value: f64,
    },

    /// 基础层错误转换
    #[error("基础层错误: {0}")]
    Foundation(#[from] HlError),
}

impl From<IoError> for HlError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::MissingColumn { file, line, expected, actual } => HlError::parse(
                file,
                line,
                format!("期望至少 {expected} 列, 实际 {actual} 列"),
            ),
            IoError::InvalidNumber { file, line, column, token } => {
                HlError::parse(file, line, format!("第 {column} 列无法解析为数值: '{token}'"))
            }
            IoError::NotInteger { file, line, column, value } => {
                HlError::parse(file, line, format!("第 {column} 列应为整数编号, 实际 {value}"))
            }
            IoError::Foundation(err) => err,
        }
    }
}
