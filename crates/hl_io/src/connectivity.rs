// crates/hl_io/src/connectivity.rs

//! 连接表
//!
//! 每个耦合通道的连接文件有固定的列布局：源键列、目标键列以及可选的权重列。
//! 键列有三种形式：
//!
//! | 形式 | 列 | 解析方式 |
//! |------|----|----------|
//! | `Node` | 一列一基编号 | 减 1 |
//! | `Svat` | `svat layer` 两列 | [`SvatLookup`] |
//! | `Coord` | `x y` 两列 | [`CoordinateLookup`] |
//!
//! 解析结果是零基的 `(source_idx, target_idx, weights?)` 三个并列数组。

use std::path::Path;

use hl_foundation::{HlError, HlResult};

use crate::lookup::{CoordinateLookup, SvatLookup};
use crate::table::{Table, TableRow};

/// 键列定义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColumns {
    /// 一基节点编号
    Node(usize),
    /// `(svat, layer)` 键
    Svat {
        /// svat 编号列
        id: usize,
        /// 层号列
        layer: usize,
    },
    /// `(x, y)` 坐标键
    Coord {
        /// x 列
        x: usize,
        /// y 列
        y: usize,
    },
}

impl KeyColumns {
    fn max_column(self) -> usize {
        match self {
            KeyColumns::Node(c) => c,
            KeyColumns::Svat { id, layer } => id.max(layer),
            KeyColumns::Coord { x, y } => x.max(y),
        }
    }
}

/// 连接文件的列布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    /// 表头行数
    pub skip_rows: usize,
    /// 源键
    pub source: KeyColumns,
    /// 目标键
    pub target: KeyColumns,
    /// 权重列
    pub weight: Option<usize>,
}

impl ColumnLayout {
    /// `node svat layer`，无表头（MSW → MF6）
    pub const SVAT_TO_NODE: Self = Self {
        skip_rows: 0,
        source: KeyColumns::Svat { id: 1, layer: 2 },
        target: KeyColumns::Node(0),
        weight: None,
    };

    /// `x y node`，一行表头（MF6 / MSW → DFM）
    pub const NODE_TO_COORD: Self = Self {
        skip_rows: 1,
        source: KeyColumns::Node(2),
        target: KeyColumns::Coord { x: 0, y: 1 },
        weight: None,
    };

    /// `node x y weight`，一行表头（DFM 水位 → MF6 / MSW）
    pub const WEIGHTED_COORD_TO_NODE: Self = Self {
        skip_rows: 1,
        source: KeyColumns::Coord { x: 1, y: 2 },
        target: KeyColumns::Node(0),
        weight: Some(3),
    };

    /// 需要的最少列数
    pub fn required_columns(&self) -> usize {
        let max = self
            .source
            .max_column()
            .max(self.target.max_column())
            .max(self.weight.unwrap_or(0));
        max + 1
    }
}

/// 解析键列所需的查找表
#[derive(Debug, Clone, Copy, Default)]
pub struct Lookups<'a> {
    /// SVAT 查找表
    pub svat: Option<&'a SvatLookup>,
    /// 坐标查找表
    pub coords: Option<&'a CoordinateLookup>,
}

impl<'a> Lookups<'a> {
    /// 仅含 SVAT 查找表
    pub fn svat(lookup: &'a SvatLookup) -> Self {
        Self {
            svat: Some(lookup),
            coords: None,
        }
    }

    /// 仅含坐标查找表
    pub fn coords(lookup: &'a CoordinateLookup) -> Self {
        Self {
            svat: None,
            coords: Some(lookup),
        }
    }
}

/// 零基连接记录
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Connectivity {
    /// 每条记录的源索引
    pub source_idx: Vec<usize>,
    /// 每条记录的目标索引
    pub target_idx: Vec<usize>,
    /// 每条记录的权重（仅带权重列的文件）
    pub weights: Option<Vec<f64>>,
}

impl Connectivity {
    /// 按列布局解析连接表
    ///
    /// # 错误
    ///
    /// - 列数不足：`HlError::Parse`
    /// - 一基编号转换后为负：`HlError::NegativeNodeId`
    /// - 键不在查找表中，或缺少所需查找表：`HlError::UnresolvedKey` / `HlError::Config`
    pub fn from_table(table: &Table, layout: &ColumnLayout, lookups: Lookups<'_>) -> HlResult<Self> {
        table.require_columns(layout.required_columns())?;

        let n = table.len();
        let mut source_idx = Vec::with_capacity(n);
        let mut target_idx = Vec::with_capacity(n);
        let mut weights = layout.weight.map(|_| Vec::with_capacity(n));

        for row in table.rows() {
            source_idx.push(resolve_key(table, row, layout.source, lookups)?);
            target_idx.push(resolve_key(table, row, layout.target, lookups)?);
            if let (Some(col), Some(w)) = (layout.weight, weights.as_mut()) {
                w.push(table.float(row, col)?);
            }
        }

        Ok(Self {
            source_idx,
            target_idx,
            weights,
        })
    }

    /// 记录数
    #[inline]
    pub fn len(&self) -> usize {
        self.source_idx.len()
    }

    /// 是否没有记录
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source_idx.is_empty()
    }

    /// 最大源索引 + 1
    pub fn source_extent(&self) -> usize {
        self.source_idx.iter().max().map_or(0, |m| m + 1)
    }

    /// 最大目标索引 + 1
    pub fn target_extent(&self) -> usize {
        self.target_idx.iter().max().map_or(0, |m| m + 1)
    }

    /// 交换源与目标（用于反向通道）
    ///
    /// 文件权重只对原方向有意义，反向后丢弃。
    pub fn reversed(&self) -> Self {
        Self {
            source_idx: self.target_idx.clone(),
            target_idx: self.source_idx.clone(),
            weights: None,
        }
    }
}

fn resolve_key(
    table: &Table,
    row: &TableRow,
    key: KeyColumns,
    lookups: Lookups<'_>,
) -> HlResult<usize> {
    let file = table.path();
    match key {
        KeyColumns::Node(col) => {
            let id = table.integer(row, col)? - 1;
            if id < 0 {
                return Err(HlError::NegativeNodeId {
                    file: file.to_path_buf(),
                    line: row.line(),
                    id,
                });
            }
            Ok(id as usize)
        }
        KeyColumns::Svat { id, layer } => {
            let lookup = lookups.svat.ok_or_else(|| missing_lookup(file, "svat"))?;
            lookup.resolve(table.integer(row, id)?, table.integer(row, layer)?, file, row.line())
        }
        KeyColumns::Coord { x, y } => {
            let lookup = lookups.coords.ok_or_else(|| missing_lookup(file, "coordinate"))?;
            lookup.resolve(table.float(row, x)?, table.float(row, y)?, file, row.line())
        }
    }
}

fn missing_lookup(file: &Path, kind: &str) -> HlError {
    HlError::config(format!("{} 需要 {kind} 查找表", file.display()))
}
