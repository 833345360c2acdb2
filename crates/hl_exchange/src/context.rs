// crates/hl_exchange/src/context.rs

//! 装配上下文：查找表与系统规模

use hl_config::LookupConfig;
use hl_foundation::HlResult;
use hl_io::{CoordinateLookup, Lookups, SvatLookup, TableCache};
use tracing::{info, warn};

/// DFM-2D 点文件的表头行数
const DFLOW2D_POINTS_HEADER: usize = 1;

/// 已加载的查找表
#[derive(Debug, Clone, Default)]
pub struct LookupSet {
    /// `(svat, layer)` → MSW 内部索引
    pub svat: Option<SvatLookup>,
    /// DFM-1D 坐标查找
    pub dflow1d: Option<CoordinateLookup>,
    /// DFM-2D 坐标查找
    pub dflow2d: Option<CoordinateLookup>,
}

impl LookupSet {
    /// 加载配置中声明的查找表
    ///
    /// svat 与 DFM-1D 文件缺失是错误；DFM-2D 点文件缺失时该查找表留空，
    /// 2D 通道组随之跳过。
    pub fn load(config: &LookupConfig, cache: &TableCache) -> HlResult<Self> {
        let svat = match &config.svat {
            Some(path) => {
                let table = cache.load(path, 0)?;
                Some(SvatLookup::from_table(&table)?)
            }
            None => None,
        };
        let dflow1d = match &config.dflow1d_points {
            Some(path) => {
                let table = cache.load(path, 0)?;
                Some(CoordinateLookup::from_table(&table)?)
            }
            None => None,
        };
        let dflow2d = match &config.dflow2d_points {
            Some(path) if path.is_file() => {
                let table = cache.load(path, DFLOW2D_POINTS_HEADER)?;
                Some(CoordinateLookup::from_table(&table)?)
            }
            Some(path) => {
                warn!(file = %path.display(), "DFM-2D point file not found, 2D coupling disabled");
                None
            }
            None => None,
        };

        info!(
            svats = svat.as_ref().map_or(0, SvatLookup::row_count),
            dflow1d_points = dflow1d.as_ref().map_or(0, CoordinateLookup::len),
            dflow2d_points = dflow2d.as_ref().map_or(0, CoordinateLookup::len),
            "lookups loaded"
        );
        Ok(Self { svat, dflow1d, dflow2d })
    }

    pub(crate) fn svat(&self) -> Lookups<'_> {
        Lookups {
            svat: self.svat.as_ref(),
            coords: None,
        }
    }

    pub(crate) fn dflow1d(&self) -> Lookups<'_> {
        Lookups {
            svat: None,
            coords: self.dflow1d.as_ref(),
        }
    }

    pub(crate) fn dflow2d(&self) -> Lookups<'_> {
        Lookups {
            svat: None,
            coords: self.dflow2d.as_ref(),
        }
    }
}

/// 各系统声明的数组长度
///
/// 未声明的规模取连接记录的最大索引 + 1。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemSizes {
    /// MF6 网格单元数
    pub mf6_nodes: Option<usize>,
    /// MF6 RCH 单元数
    pub mf6_recharge: Option<usize>,
    /// MF6 灌溉井数
    pub mf6_wells: Option<usize>,
    /// MF6 RIV1 河段数
    pub mf6_river: Option<usize>,
    /// MF6 RIV2 河段数
    pub mf6_passive_river: Option<usize>,
    /// MF6 DRN 单元数
    pub mf6_drainage: Option<usize>,
    /// MSW svat 数
    pub msw_svats: Option<usize>,
    /// DFM-1D 节点数
    pub dflow1d_nodes: Option<usize>,
    /// DFM-2D 单元数
    pub dflow2d_nodes: Option<usize>,
}

pub(crate) fn size_or_extent(declared: Option<usize>, extent: usize) -> usize {
    declared.unwrap_or(extent)
}
