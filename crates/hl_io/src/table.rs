// crates/hl_io/src/table.rs

//! 空白分隔数值表
//!
//! 连接表和查找表都是空白分隔的文本表：
//! - 文件开头固定数量的表头行（按通道而定）被跳过
//! - 空行与 `#` 开头的注释行被跳过
//! - 其余每行按空白切分，所有列解析为 f64
//!
//! 行号始终是文件中的物理行号（从 1 开始），用于错误报告。
//!
//! # 使用示例
//!
//! ```
//! use std::path::Path;
//! use hl_io::table::parse_table;
//!
//! let content = "x y id\n5.0 5.0 1\n25.0 15.0 2\n";
//! let table = parse_table(content, 1, Path::new("<string>"))?;
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.rows()[1].line(), 3);
//! # Ok::<(), hl_io::IoError>(())
//! ```

use std::path::{Path, PathBuf};

use hl_foundation::HlError;

use crate::error::{IoError, IoResult};

/// 注释行前缀
pub const COMMENT_PREFIX: char = '#';

/// 表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    line: usize,
    values: Vec<f64>,
}

impl TableRow {
    /// 物理行号（从 1 开始）
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// 列数
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有列
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 全部列值
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// 已解析的数值表
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    path: PathBuf,
    rows: Vec<TableRow>,
}

impl Table {
    /// 来源文件
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 数据行
    #[inline]
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// 数据行数
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否没有数据行
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 读取浮点列
    pub fn float(&self, row: &TableRow, column: usize) -> IoResult<f64> {
        row.values
            .get(column)
            .copied()
            .ok_or_else(|| IoError::MissingColumn {
                file: self.path.clone(),
                line: row.line,
                expected: column + 1,
                actual: row.values.len(),
            })
    }

    /// 读取整数列
    ///
    /// 值必须是 i32 范围内的整数（允许写成 `3.0`）。编号列按 32 位整数存储，
    /// 超出范围的值不会进入规模推导。
    pub fn integer(&self, row: &TableRow, column: usize) -> IoResult<i64> {
        let value = self.float(row, column)?;
        let in_range = value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX);
        if !value.is_finite() || value.fract() != 0.0 || !in_range {
            return Err(IoError::NotInteger {
                file: self.path.clone(),
                line: row.line,
                column: column + 1,
                value,
            });
        }
        Ok(value as i64)
    }

    /// 校验每一行至少有 `n` 列
    pub fn require_columns(&self, n: usize) -> IoResult<()> {
        match self.rows.iter().find(|r| r.values.len() < n) {
            Some(row) => Err(IoError::MissingColumn {
                file: self.path.clone(),
                line: row.line,
                expected: n,
                actual: row.values.len(),
            }),
            None => Ok(()),
        }
    }
}

/// 从文件加载数值表
///
/// # 错误
///
/// - 文件不存在：`HlError::FileNotFound`
/// - 读取失败：`HlError::Io`
/// - 数值无法解析：`IoError::InvalidNumber`
pub fn load_table(path: &Path, skip_rows: usize) -> IoResult<Table> {
    if !path.is_file() {
        return Err(HlError::file_not_found(path).into());
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        HlError::io_with_source(format!("读取 {} 失败", path.display()), e)
    })?;
    parse_table(&content, skip_rows, path)
}

/// 从字符串解析数值表
pub fn parse_table(content: &str, skip_rows: usize, origin: &Path) -> IoResult<Table> {
    let mut rows = Vec::new();

    for (line_idx, line) in content.lines().enumerate().skip(skip_rows) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
            continue;
        }

        let values = trimmed
            .split_whitespace()
            .enumerate()
            .map(|(col, token)| {
                token.parse::<f64>().map_err(|_| IoError::InvalidNumber {
                    file: origin.to_path_buf(),
                    line: line_idx + 1,
                    column: col + 1,
                    token: token.to_string(),
                })
            })
            .collect::<IoResult<Vec<f64>>>()?;

        rows.push(TableRow {
            line: line_idx + 1,
            values,
        });
    }

    Ok(Table {
        path: origin.to_path_buf(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_skip_header_and_comments() {
        let content = "header line\n# comment\n\n1 2 3\n  4\t5   6  \n";
        let table = parse_table(content, 1, Path::new("t.dat")).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].values(), &[1.0, 2.0, 3.0]);
        assert_eq!(table.rows()[0].line(), 4);
        assert_eq!(table.rows()[1].values(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_skip_rows_counts_physical_lines() {
        // 表头行即使看起来像数字也会被跳过
        let table = parse_table("9 9 9\n1 2 3\n", 1, Path::new("t.dat")).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_invalid_number_reports_location() {
        let err = parse_table("1 2 3\n4 x 6\n", 0, Path::new("map.dxc")).unwrap_err();
        match err {
            IoError::InvalidNumber { line, column, token, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 2);
                assert_eq!(token, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_integer_column() {
        let table = parse_table("1 2.0 2.5\n", 0, Path::new("t.dat")).unwrap();
        let row = &table.rows()[0];
        assert_eq!(table.integer(row, 0).unwrap(), 1);
        assert_eq!(table.integer(row, 1).unwrap(), 2);
        assert!(matches!(table.integer(row, 2), Err(IoError::NotInteger { .. })));
        assert!(matches!(table.integer(row, 3), Err(IoError::MissingColumn { .. })));
    }

    #[test]
    fn test_integer_out_of_range() {
        let table = parse_table("1e19 -3e9 2147483647\n", 0, Path::new("riv.dmm")).unwrap();
        let row = &table.rows()[0];
        assert!(matches!(
            table.integer(row, 0),
            Err(IoError::NotInteger { line: 1, column: 1, .. })
        ));
        assert!(matches!(table.integer(row, 1), Err(IoError::NotInteger { .. })));
        assert_eq!(table.integer(row, 2).unwrap(), i64::from(i32::MAX));

        let err: HlError = table.integer(row, 0).unwrap_err().into();
        assert!(matches!(err, HlError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_require_columns() {
        let table = parse_table("1 2 3\n4 5\n", 0, Path::new("t.dat")).unwrap();
        assert!(table.require_columns(2).is_ok());
        assert!(matches!(
            table.require_columns(3),
            Err(IoError::MissingColumn { line: 2, expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err: HlError = load_table(Path::new("/nonexistent/DFLOWFM1D_POINTS.DAT"), 0)
            .unwrap_err()
            .into();
        assert!(matches!(err, HlError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1 10 1").unwrap();
        writeln!(file, "2 11 1").unwrap();
        let table = load_table(file.path(), 0).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.path(), file.path());
    }
}
