// crates/hl_exchange/src/assembly.rs

//! 通道装配
//!
//! 每个通道组读取自己的连接文件，通过查找表解析键，按物理量选择策略构建映射：
//!
//! | 物理量 | 策略 |
//! |--------|------|
//! | 通量 | SUM |
//! | 水头 / 水位 | AVERAGE，文件带距离权重时 WEIGHT |
//! | 储量 | SUM 后左乘换算项 |
//! | 反向通量 | 历史通量 WEIGHT，冷启动 SUM |
//!
//! 可选通道（灌溉井、MSW–2D）仅在启用且文件存在时装配，否则跳过并记录警告。

use std::path::Path;

use hl_config::{
    ActiveRiverConfig, CouplingConfig, MetaModConfig, MswRiverConfig, MswSurfaceConfig,
    PassiveRiverConfig,
};
use hl_foundation::{HlError, HlResult};
use hl_io::{ColumnLayout, Connectivity, Lookups, TableCache};
use hl_mapping::{build_mapping, storage_conversion_term, CellGeometry, Mapping};
use tracing::{debug, info, warn};

use crate::context::{size_or_extent, LookupSet, SystemSizes};
use crate::kind::ExchangeKind;
use crate::reverse::ReverseChannel;
use crate::set::ExchangeSet;

fn load_connectivity(
    cache: &TableCache,
    path: &Path,
    layout: &ColumnLayout,
    lookups: Lookups<'_>,
) -> HlResult<Connectivity> {
    let table = cache.load(path, layout.skip_rows)?;
    let conn = Connectivity::from_table(&table, layout, lookups)?;
    debug!(file = %path.display(), records = conn.len(), "connectivity loaded");
    Ok(conn)
}

fn build(
    kind: ExchangeKind,
    conn: &Connectivity,
    source_size: usize,
    target_size: usize,
) -> HlResult<Mapping> {
    let mapping = build_mapping(
        &conn.source_idx,
        &conn.target_idx,
        source_size,
        target_size,
        kind.policy(),
        conn.weights.as_deref(),
    )?;
    debug!(
        exchange = %kind,
        rows = target_size,
        cols = source_size,
        unmapped = mapping.unmapped_count(),
        "exchange built"
    );
    Ok(mapping)
}

fn require_lookup<T>(lookup: Option<&T>, name: &str, group: &str) -> HlResult<()> {
    match lookup {
        Some(_) => Ok(()),
        None => Err(HlError::config(format!("{group} 需要 {name} 查找表"))),
    }
}

/// 装配 MF6 ↔ MSW 通道组
///
/// `geometry` 为 MF6 单元几何，缺省时储量交换被跳过（换算项无法计算）。
pub fn assemble_metamod(
    config: &MetaModConfig,
    lookups: &LookupSet,
    geometry: Option<CellGeometry<'_>>,
    sizes: &SystemSizes,
    cache: &TableCache,
) -> HlResult<ExchangeSet> {
    let svat = lookups.svat.as_ref();
    require_lookup(svat, "svat", "metamod")?;
    let msw_size = size_or_extent(sizes.msw_svats, svat.map_or(0, |s| s.row_count()));

    let mut set = ExchangeSet::new();

    // node2svat: 源 = MSW，目标 = MF6 节点
    let node2svat = load_connectivity(
        cache,
        &config.node_to_svat,
        &ColumnLayout::SVAT_TO_NODE,
        lookups.svat(),
    )?;
    let mf6_size = size_or_extent(
        sizes.mf6_nodes.or(geometry.map(|g| g.area.len())),
        node2svat.target_extent(),
    );

    match geometry {
        Some(geometry) => {
            let mut storage = build(ExchangeKind::MswToMfStorage, &node2svat, msw_size, mf6_size)?;
            let term = storage_conversion_term(config.storage_coefficient, geometry)?;
            storage.scale_rows(&term)?;
            set.insert(ExchangeKind::MswToMfStorage, storage);
        }
        None => warn!(
            exchange = %ExchangeKind::MswToMfStorage,
            "no groundwater cell geometry, storage exchange omitted"
        ),
    }

    set.insert(
        ExchangeKind::MfToMswHead,
        build(ExchangeKind::MfToMswHead, &node2svat.reversed(), mf6_size, msw_size)?,
    );

    let rch2svat = load_connectivity(
        cache,
        &config.recharge_to_svat,
        &ColumnLayout::SVAT_TO_NODE,
        lookups.svat(),
    )?;
    let rch_size = size_or_extent(sizes.mf6_recharge, rch2svat.target_extent());
    set.insert(
        ExchangeKind::MswToMfRecharge,
        build(ExchangeKind::MswToMfRecharge, &rch2svat, msw_size, rch_size)?,
    );

    if config.enable_sprinkling {
        match config.sprinkling_to_svat.as_deref() {
            Some(path) if path.is_file() => {
                let wel2svat =
                    load_connectivity(cache, path, &ColumnLayout::SVAT_TO_NODE, lookups.svat())?;
                let wel_size = size_or_extent(sizes.mf6_wells, wel2svat.target_extent());
                set.insert(
                    ExchangeKind::MswToMfSprinkling,
                    build(ExchangeKind::MswToMfSprinkling, &wel2svat, msw_size, wel_size)?,
                );
            }
            other => warn!(
                exchange = %ExchangeKind::MswToMfSprinkling,
                file = ?other,
                "sprinkling map not available, exchange omitted"
            ),
        }
    }

    info!(group = "metamod", exchanges = set.len(), msw_size, mf6_size, "channel group assembled");
    Ok(set)
}

/// 装配主动河流通道组（MF6 RIV1 ↔ DFM-1D）
pub fn assemble_active_river(
    config: &ActiveRiverConfig,
    lookups: &LookupSet,
    sizes: &SystemSizes,
    cache: &TableCache,
) -> HlResult<ExchangeSet> {
    require_lookup(lookups.dflow1d.as_ref(), "DFM-1D", "active_river")?;
    let mut set = ExchangeSet::new();

    let flux = load_connectivity(
        cache,
        &config.river_to_dflow1d_flux,
        &ColumnLayout::NODE_TO_COORD,
        lookups.dflow1d(),
    )?;
    let riv_size = size_or_extent(sizes.mf6_river, flux.source_extent());
    let dflow_size = size_or_extent(sizes.dflow1d_nodes, flux.target_extent());

    set.insert(
        ExchangeKind::RiverToDflow1dFlux,
        build(ExchangeKind::RiverToDflow1dFlux, &flux, riv_size, dflow_size)?,
    );
    set.insert_reverse(ReverseChannel::cold(
        ExchangeKind::Dflow1dToRiverFlux,
        flux.reversed(),
        dflow_size,
        riv_size,
    )?);

    let stage = load_connectivity(
        cache,
        &config.dflow1d_to_river_stage,
        &ColumnLayout::WEIGHTED_COORD_TO_NODE,
        lookups.dflow1d(),
    )?;
    set.insert(
        ExchangeKind::Dflow1dToRiverStage,
        build(
            ExchangeKind::Dflow1dToRiverStage,
            &stage,
            size_or_extent(sizes.dflow1d_nodes, stage.source_extent()),
            size_or_extent(sizes.mf6_river, stage.target_extent()),
        )?,
    );

    info!(group = "active_river", exchanges = set.len(), riv_size, dflow_size, "channel group assembled");
    Ok(set)
}

/// 装配被动河流通道组（MF6 RIV2 / DRN → DFM-1D）
pub fn assemble_passive_river(
    config: &PassiveRiverConfig,
    lookups: &LookupSet,
    sizes: &SystemSizes,
    cache: &TableCache,
) -> HlResult<ExchangeSet> {
    require_lookup(lookups.dflow1d.as_ref(), "DFM-1D", "passive_river")?;
    let mut set = ExchangeSet::new();

    let river = load_connectivity(
        cache,
        &config.river_to_dflow1d_flux,
        &ColumnLayout::NODE_TO_COORD,
        lookups.dflow1d(),
    )?;
    set.insert(
        ExchangeKind::PassiveRiverToDflow1dFlux,
        build(
            ExchangeKind::PassiveRiverToDflow1dFlux,
            &river,
            size_or_extent(sizes.mf6_passive_river, river.source_extent()),
            size_or_extent(sizes.dflow1d_nodes, river.target_extent()),
        )?,
    );

    let drainage = load_connectivity(
        cache,
        &config.drainage_to_dflow1d_flux,
        &ColumnLayout::NODE_TO_COORD,
        lookups.dflow1d(),
    )?;
    set.insert(
        ExchangeKind::DrainageToDflow1dFlux,
        build(
            ExchangeKind::DrainageToDflow1dFlux,
            &drainage,
            size_or_extent(sizes.mf6_drainage, drainage.source_extent()),
            size_or_extent(sizes.dflow1d_nodes, drainage.target_extent()),
        )?,
    );

    info!(group = "passive_river", exchanges = set.len(), "channel group assembled");
    Ok(set)
}

/// 装配 MSW ↔ DFM-1D 通道组
pub fn assemble_msw_river(
    config: &MswRiverConfig,
    lookups: &LookupSet,
    sizes: &SystemSizes,
    cache: &TableCache,
) -> HlResult<ExchangeSet> {
    require_lookup(lookups.dflow1d.as_ref(), "DFM-1D", "msw_river")?;
    let declared_msw = sizes.msw_svats.or(lookups.svat.as_ref().map(|s| s.row_count()));
    let mut set = ExchangeSet::new();

    let sprinkling = load_connectivity(
        cache,
        &config.sprinkling_to_dflow1d_flux,
        &ColumnLayout::NODE_TO_COORD,
        lookups.dflow1d(),
    )?;
    let msw_size = size_or_extent(declared_msw, sprinkling.source_extent());
    let dflow_size = size_or_extent(sizes.dflow1d_nodes, sprinkling.target_extent());
    set.insert(
        ExchangeKind::MswSprinklingToDflow1dFlux,
        build(ExchangeKind::MswSprinklingToDflow1dFlux, &sprinkling, msw_size, dflow_size)?,
    );
    set.insert_reverse(ReverseChannel::cold(
        ExchangeKind::Dflow1dToMswSprinklingFlux,
        sprinkling.reversed(),
        dflow_size,
        msw_size,
    )?);

    let ponding = load_connectivity(
        cache,
        &config.ponding_to_dflow1d_flux,
        &ColumnLayout::NODE_TO_COORD,
        lookups.dflow1d(),
    )?;
    set.insert(
        ExchangeKind::MswPondingToDflow1dFlux,
        build(
            ExchangeKind::MswPondingToDflow1dFlux,
            &ponding,
            size_or_extent(declared_msw, ponding.source_extent()),
            size_or_extent(sizes.dflow1d_nodes, ponding.target_extent()),
        )?,
    );

    info!(group = "msw_river", exchanges = set.len(), msw_size, dflow_size, "channel group assembled");
    Ok(set)
}

/// 装配 MSW ↔ DFM-2D 通道组
///
/// 未启用、DFM-2D 查找表缺失或连接文件缺失时返回 `None`。
pub fn assemble_msw_surface(
    config: &MswSurfaceConfig,
    lookups: &LookupSet,
    sizes: &SystemSizes,
    cache: &TableCache,
) -> HlResult<Option<ExchangeSet>> {
    if !config.enable {
        debug!(group = "msw_surface", "2D coupling disabled");
        return Ok(None);
    }
    if lookups.dflow2d.is_none() {
        warn!(group = "msw_surface", "no DFM-2D lookup, channel group omitted");
        return Ok(None);
    }
    for path in [&config.ponding_to_dflow2d_flux, &config.dflow2d_to_msw_stage] {
        if !path.is_file() {
            warn!(group = "msw_surface", file = %path.display(), "mapping file not found, channel group omitted");
            return Ok(None);
        }
    }

    let declared_msw = sizes.msw_svats.or(lookups.svat.as_ref().map(|s| s.row_count()));
    let mut set = ExchangeSet::new();

    let ponding = load_connectivity(
        cache,
        &config.ponding_to_dflow2d_flux,
        &ColumnLayout::NODE_TO_COORD,
        lookups.dflow2d(),
    )?;
    let msw_size = size_or_extent(declared_msw, ponding.source_extent());
    let dflow_size = size_or_extent(sizes.dflow2d_nodes, ponding.target_extent());
    set.insert(
        ExchangeKind::MswPondingToDflow2dFlux,
        build(ExchangeKind::MswPondingToDflow2dFlux, &ponding, msw_size, dflow_size)?,
    );
    set.insert_reverse(ReverseChannel::cold(
        ExchangeKind::Dflow2dToMswPondingFlux,
        ponding.reversed(),
        dflow_size,
        msw_size,
    )?);

    let stage = load_connectivity(
        cache,
        &config.dflow2d_to_msw_stage,
        &ColumnLayout::WEIGHTED_COORD_TO_NODE,
        lookups.dflow2d(),
    )?;
    set.insert(
        ExchangeKind::Dflow2dToMswPondingStage,
        build(
            ExchangeKind::Dflow2dToMswPondingStage,
            &stage,
            size_or_extent(sizes.dflow2d_nodes, stage.source_extent()),
            size_or_extent(declared_msw, stage.target_extent()),
        )?,
    );

    info!(group = "msw_surface", exchanges = set.len(), msw_size, dflow_size, "channel group assembled");
    Ok(Some(set))
}

/// 装配配置中声明的全部通道组
pub fn assemble_coupling(
    config: &CouplingConfig,
    geometry: Option<CellGeometry<'_>>,
    sizes: &SystemSizes,
    cache: &TableCache,
) -> HlResult<ExchangeSet> {
    let lookups = LookupSet::load(&config.lookups, cache)?;
    let mut all = ExchangeSet::new();

    if let Some(c) = &config.metamod {
        all.merge(assemble_metamod(c, &lookups, geometry, sizes, cache)?);
    }
    if let Some(c) = &config.active_river {
        all.merge(assemble_active_river(c, &lookups, sizes, cache)?);
    }
    if let Some(c) = &config.passive_river {
        all.merge(assemble_passive_river(c, &lookups, sizes, cache)?);
    }
    if let Some(c) = &config.msw_river {
        all.merge(assemble_msw_river(c, &lookups, sizes, cache)?);
    }
    if let Some(c) = &config.msw_surface {
        if let Some(set) = assemble_msw_surface(c, &lookups, sizes, cache)? {
            all.merge(set);
        }
    }

    info!(exchanges = all.len(), "coupling assembled");
    Ok(all)
}
