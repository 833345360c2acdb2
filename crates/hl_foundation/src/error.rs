// crates/hl_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `HlError` 枚举和 `HlResult` 类型别名，用于整个耦合引擎的错误处理。
//!
//! # 错误分类
//!
//! 1. **配置错误**（致命，装配期，不重试）：连接表/查找表缺失或格式错误、
//!    索引越界、坐标无法解析、权重长度不匹配、未知聚合策略
//! 2. **运行期错误**：步进状态机调用顺序错误、内部错误
//!
//! 所有装配期错误必须在任何外部内核步进之前返回给编排层。
//!
//! # 示例
//!
//! ```
//! use hl_foundation::error::{HlError, HlResult};
//!
//! fn read_table() -> HlResult<()> {
//!     Err(HlError::config("连接表格式错误"))
//! }
//! assert!(read_table().unwrap_err().is_configuration());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type HlResult<T> = Result<T, HlError>;

/// HydroLink 错误类型
#[derive(Error, Debug)]
pub enum HlError {
    // ========================================================================
    // IO 相关错误
    // ========================================================================

    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 文件不存在
    #[error("文件不存在: {path}")]
    FileNotFound {
        /// 未找到的路径
        path: PathBuf,
    },

    /// 文件解析错误
    #[error("文件解析错误: {file} 第{line}行: {message}")]
    Parse {
        /// 文件路径
        file: PathBuf,
        /// 行号（从 1 开始）
        line: usize,
        /// 错误信息
        message: String,
    },

    // ========================================================================
    // 拓扑与映射错误
    // ========================================================================

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    /// WEIGHT 策略缺少权重数组
    #[error("WEIGHT 策略需要权重数组, 但未提供")]
    MissingWeights,

    /// 未知聚合策略
    #[error("未知聚合策略: '{name}' (支持: sum, avg, weight)")]
    UnknownPolicy {
        /// 输入的策略名称
        name: String,
    },

    /// 查找表中不存在的键
    #[error("无法解析的键: {key} ({file} 第{line}行)")]
    UnresolvedKey {
        /// 所在文件
        file: PathBuf,
        /// 行号（从 1 开始）
        line: usize,
        /// 键的文本表示
        key: String,
    },

    /// 节点编号为负（坐标不在目标网格内）
    #[error("节点编号为负: {id} ({file} 第{line}行), 坐标不属于目标网格")]
    NegativeNodeId {
        /// 所在文件
        file: PathBuf,
        /// 行号（从 1 开始）
        line: usize,
        /// 转换为零基后的编号
        id: i64,
    },

    // ========================================================================
    // 配置错误
    // ========================================================================

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键名
        key: String,
        /// 配置值
        value: String,
        /// 无效原因说明
        reason: String,
    },

    // ========================================================================
    // 运行期错误
    // ========================================================================

    /// 步进阶段错误
    #[error("耦合步阶段错误: 期望 {expected}, 当前 {actual}")]
    InvalidPhase {
        /// 期望阶段
        expected: &'static str,
        /// 实际阶段
        actual: &'static str,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl HlError {
    /// IO 错误（带源）
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 文件不存在
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// 解析错误
    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 未知策略
    pub fn unknown_policy(name: impl Into<String>) -> Self {
        Self::UnknownPolicy { name: name.into() }
    }

    /// 无法解析的键
    pub fn unresolved_key(file: impl Into<PathBuf>, line: usize, key: impl Into<String>) -> Self {
        Self::UnresolvedKey {
            file: file.into(),
            line,
            key: key.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// 是否属于装配期配置错误
    ///
    /// 配置错误不可重试，编排层应在任何内核步进之前终止耦合运行。
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::InvalidPhase { .. } | Self::Internal { .. })
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl HlError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> HlResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查索引是否在范围内
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> HlResult<()> {
        if index >= len {
            Err(Self::index_out_of_bounds(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

// ========================================================================
// 标准库错误转换
// ========================================================================

impl From<std::io::Error> for HlError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HlError::config("测试配置错误");
        assert!(err.to_string().contains("配置错误"));
    }

    #[test]
    fn test_file_not_found() {
        let err = HlError::file_not_found("/path/to/mod2svat.inp");
        assert!(err.to_string().contains("mod2svat.inp"));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let err = HlError::index_out_of_bounds("target", 10, 5);
        let msg = err.to_string();
        assert!(msg.contains("target"));
        assert!(msg.contains("10"));
        assert!(msg.contains("5"));
    }

    #[test]
    fn test_check_size() {
        assert!(HlError::check_size("weights", 3, 3).is_ok());
        assert!(matches!(
            HlError::check_size("weights", 3, 2),
            Err(HlError::SizeMismatch { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_check_index() {
        assert!(HlError::check_index("source", 2, 3).is_ok());
        assert!(HlError::check_index("source", 3, 3).is_err());
    }

    #[test]
    fn test_configuration_classification() {
        assert!(HlError::unknown_policy("median").is_configuration());
        assert!(HlError::MissingWeights.is_configuration());
        assert!(!HlError::internal("x").is_configuration());
        assert!(!HlError::InvalidPhase {
            expected: "ForwardMapped",
            actual: "Init"
        }
        .is_configuration());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: HlError = io_err.into();
        assert!(matches!(err, HlError::Io { .. }));
    }
}
