// crates/hl_io/src/lib.rs

//! HydroLink IO 层
//!
//! 读取耦合拓扑：连接表、坐标/SVAT 查找表，以及按修改时间失效的表缓存。
//!
//! # 模块概览
//!
//! - [`table`]: 空白分隔数值表解析
//! - [`lookup`]: 坐标与 SVAT 查找表
//! - [`connectivity`]: 按列布局把连接表解析为零基记录
//! - [`cache`]: 共享表缓存
//! - [`error`]: `IoError`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod connectivity;
pub mod error;
pub mod lookup;
pub mod table;

pub use cache::TableCache;
pub use connectivity::{ColumnLayout, Connectivity, KeyColumns, Lookups};
pub use error::{IoError, IoResult};
pub use lookup::{CoordKey, CoordinateLookup, SvatLookup};
pub use table::{load_table, parse_table, Table, TableRow};
