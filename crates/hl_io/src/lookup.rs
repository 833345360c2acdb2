// crates/hl_io/src/lookup.rs

//! 查找表
//!
//! 把连接表中的外部键翻译为接收系统的零基节点索引：
//! - [`CoordinateLookup`]: `(x, y)` → DFM-1D / DFM-2D 节点
//! - [`SvatLookup`]: `(svat, layer)` → MSW 内部索引
//!
//! 坐标键按单精度比较：连接表与点文件由不同工具写出，
//! 在 f64 下末位常有差异，而 f32 下一致。

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use hl_foundation::{HlError, HlResult};
use tracing::debug;

use crate::table::Table;

/// 单精度坐标键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey {
    x: u32,
    y: u32,
}

impl CoordKey {
    /// 由坐标构建键
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: Self::bits(x),
            y: Self::bits(y),
        }
    }

    fn bits(v: f64) -> u32 {
        let v = v as f32;
        // -0.0 与 0.0 视为同一坐标
        if v == 0.0 {
            0.0f32.to_bits()
        } else {
            v.to_bits()
        }
    }

    /// x 坐标（单精度）
    pub fn x(&self) -> f32 {
        f32::from_bits(self.x)
    }

    /// y 坐标（单精度）
    pub fn y(&self) -> f32 {
        f32::from_bits(self.y)
    }
}

impl fmt::Display for CoordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x(), self.y())
    }
}

/// 坐标到节点的查找表
#[derive(Debug, Clone, Default)]
pub struct CoordinateLookup {
    nodes: HashMap<CoordKey, usize>,
    node_count: usize,
}

impl CoordinateLookup {
    /// 由点文件构建
    ///
    /// 列为 `x y node_id`，编号从 1 开始。编号转换后为负说明坐标不在网格内，
    /// 返回 `NegativeNodeId`。重复坐标以最后一行为准。
    pub fn from_table(table: &Table) -> HlResult<Self> {
        table.require_columns(3)?;

        let mut nodes = HashMap::with_capacity(table.len());
        let mut node_count = 0;
        for row in table.rows() {
            let x = table.float(row, 0)?;
            let y = table.float(row, 1)?;
            let id = table.integer(row, 2)? - 1;
            if id < 0 {
                return Err(HlError::NegativeNodeId {
                    file: table.path().to_path_buf(),
                    line: row.line(),
                    id,
                });
            }
            let id = id as usize;
            node_count = node_count.max(id + 1);
            nodes.insert(CoordKey::new(x, y), id);
        }

        debug!(
            file = %table.path().display(),
            points = nodes.len(),
            "coordinate lookup built"
        );
        Ok(Self { nodes, node_count })
    }

    /// 由 `(x, y, 零基节点)` 三元组直接构建
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64, usize)>) -> Self {
        let mut lookup = Self::default();
        for (x, y, id) in points {
            lookup.node_count = lookup.node_count.max(id + 1);
            lookup.nodes.insert(CoordKey::new(x, y), id);
        }
        lookup
    }

    /// 查询坐标对应的节点
    pub fn get(&self, x: f64, y: f64) -> Option<usize> {
        self.nodes.get(&CoordKey::new(x, y)).copied()
    }

    /// 查询坐标，未命中时返回带位置信息的错误
    pub fn resolve(&self, x: f64, y: f64, file: &Path, line: usize) -> HlResult<usize> {
        self.get(x, y)
            .ok_or_else(|| HlError::unresolved_key(file, line, CoordKey::new(x, y).to_string()))
    }

    /// 点数
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 最大节点编号 + 1
    pub fn node_count(&self) -> usize {
        self.node_count
    }
}

/// SVAT 查找表
///
/// `mod2svat.inp` 每行 `mf6_node svat layer`，行序号即 MSW 内部索引。
#[derive(Debug, Clone, Default)]
pub struct SvatLookup {
    svats: HashMap<(i64, i64), usize>,
    row_count: usize,
}

impl SvatLookup {
    /// 由 `mod2svat.inp` 构建
    pub fn from_table(table: &Table) -> HlResult<Self> {
        table.require_columns(3)?;

        let mut svats = HashMap::with_capacity(table.len());
        for (index, row) in table.rows().iter().enumerate() {
            let svat = table.integer(row, 1)?;
            let layer = table.integer(row, 2)?;
            svats.insert((svat, layer), index);
        }

        debug!(
            file = %table.path().display(),
            svats = svats.len(),
            rows = table.len(),
            "svat lookup built"
        );
        Ok(Self {
            svats,
            row_count: table.len(),
        })
    }

    /// 查询 `(svat, layer)` 对应的内部索引
    pub fn get(&self, svat: i64, layer: i64) -> Option<usize> {
        self.svats.get(&(svat, layer)).copied()
    }

    /// 查询，未命中时返回带位置信息的错误
    pub fn resolve(&self, svat: i64, layer: i64, file: &Path, line: usize) -> HlResult<usize> {
        self.get(svat, layer).ok_or_else(|| {
            HlError::unresolved_key(file, line, format!("svat={svat}, layer={layer}"))
        })
    }

    /// 不同键的数量
    pub fn len(&self) -> usize {
        self.svats.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.svats.is_empty()
    }

    /// MSW 内部数组长度（文件行数）
    pub fn row_count(&self) -> usize {
        self.row_count
    }
}
