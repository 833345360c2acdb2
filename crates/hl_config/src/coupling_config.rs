// crates/hl_config/src/coupling_config.rs

//! CouplingConfig - 耦合拓扑配置
//!
//! 声明查找表和各通道组的连接文件。所有通道组都是可选的，
//! 未声明的组不会被装配。
//!
//! 相对路径以配置文件所在目录为基准解析。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// 耦合拓扑配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouplingConfig {
    /// 查找表
    #[serde(default)]
    pub lookups: LookupConfig,

    /// MF6 ↔ MSW
    #[serde(default)]
    pub metamod: Option<MetaModConfig>,

    /// MF6 RIV1 ↔ DFM-1D（主动河流）
    #[serde(default)]
    pub active_river: Option<ActiveRiverConfig>,

    /// MF6 RIV2 / DRN → DFM-1D（被动河流）
    #[serde(default)]
    pub passive_river: Option<PassiveRiverConfig>,

    /// MSW ↔ DFM-1D
    #[serde(default)]
    pub msw_river: Option<MswRiverConfig>,

    /// MSW ↔ DFM-2D
    #[serde(default)]
    pub msw_surface: Option<MswSurfaceConfig>,
}

/// 查找表文件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// `mod2svat.inp`
    #[serde(default)]
    pub svat: Option<PathBuf>,

    /// DFM-1D 点文件（无表头）
    #[serde(default)]
    pub dflow1d_points: Option<PathBuf>,

    /// DFM-2D 点文件（一行表头）
    #[serde(default)]
    pub dflow2d_points: Option<PathBuf>,
}

/// MF6 ↔ MSW 连接
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaModConfig {
    /// 节点 → svat
    pub node_to_svat: PathBuf,

    /// 补给节点 → svat
    pub recharge_to_svat: PathBuf,

    /// 是否启用灌溉井
    #[serde(default)]
    pub enable_sprinkling: bool,

    /// 灌溉井 → svat
    #[serde(default)]
    pub sprinkling_to_svat: Option<PathBuf>,

    /// MF6 是否使用储水系数（STORAGECOEFFICIENT）
    #[serde(default)]
    pub storage_coefficient: bool,
}

/// 主动河流连接
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRiverConfig {
    /// RIV1 → DFM-1D 通量（`x y riv_id`）
    pub river_to_dflow1d_flux: PathBuf,

    /// DFM-1D 水位 → RIV1（`riv_id x y weight`）
    pub dflow1d_to_river_stage: PathBuf,
}

/// 被动河流连接
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveRiverConfig {
    /// RIV2 → DFM-1D 通量
    pub river_to_dflow1d_flux: PathBuf,

    /// DRN → DFM-1D 通量
    pub drainage_to_dflow1d_flux: PathBuf,
}

/// MSW ↔ DFM-1D 连接
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MswRiverConfig {
    /// 地表水灌溉 → DFM-1D
    pub sprinkling_to_dflow1d_flux: PathBuf,

    /// 积水径流 → DFM-1D
    pub ponding_to_dflow1d_flux: PathBuf,
}

/// MSW ↔ DFM-2D 连接
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MswSurfaceConfig {
    /// 是否启用
    #[serde(default)]
    pub enable: bool,

    /// 积水 → DFM-2D
    pub ponding_to_dflow2d_flux: PathBuf,

    /// DFM-2D 水位 → MSW 积水（`svat_index x y weight`）
    pub dflow2d_to_msw_stage: PathBuf,
}

impl CouplingConfig {
    /// 从文件加载配置
    ///
    /// 解析后把相对路径解析到配置文件目录，再执行验证。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        let mut config: CouplingConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(metamod) = &self.metamod {
            if metamod.enable_sprinkling && metamod.sprinkling_to_svat.is_none() {
                return Err(ConfigError::InvalidValue {
                    key: "metamod.sprinkling_to_svat".to_string(),
                    value: "null".to_string(),
                    reason: "启用灌溉井时必须提供连接文件".to_string(),
                });
            }
            if self.lookups.svat.is_none() {
                return Err(ConfigError::Missing(
                    "lookups.svat (metamod 需要 svat 查找表)".to_string(),
                ));
            }
        }

        let needs_dflow1d = self.active_river.is_some()
            || self.passive_river.is_some()
            || self.msw_river.is_some();
        if needs_dflow1d && self.lookups.dflow1d_points.is_none() {
            return Err(ConfigError::Missing(
                "lookups.dflow1d_points (河流通道需要 DFM-1D 点文件)".to_string(),
            ));
        }

        // 2D 点文件缺失时装配层会跳过该组，这里只检查声明
        if self.surface_enabled() && self.lookups.dflow2d_points.is_none() {
            return Err(ConfigError::Missing(
                "lookups.dflow2d_points (msw_surface 需要 DFM-2D 点文件)".to_string(),
            ));
        }

        Ok(())
    }

    /// 把所有相对路径解析到 `base` 目录
    pub fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        for p in [
            &mut self.lookups.svat,
            &mut self.lookups.dflow1d_points,
            &mut self.lookups.dflow2d_points,
        ]
        .into_iter()
        .flatten()
        {
            join(p);
        }

        if let Some(c) = &mut self.metamod {
            join(&mut c.node_to_svat);
            join(&mut c.recharge_to_svat);
            if let Some(p) = &mut c.sprinkling_to_svat {
                join(p);
            }
        }
        if let Some(c) = &mut self.active_river {
            join(&mut c.river_to_dflow1d_flux);
            join(&mut c.dflow1d_to_river_stage);
        }
        if let Some(c) = &mut self.passive_river {
            join(&mut c.river_to_dflow1d_flux);
            join(&mut c.drainage_to_dflow1d_flux);
        }
        if let Some(c) = &mut self.msw_river {
            join(&mut c.sprinkling_to_dflow1d_flux);
            join(&mut c.ponding_to_dflow1d_flux);
        }
        if let Some(c) = &mut self.msw_surface {
            join(&mut c.ponding_to_dflow2d_flux);
            join(&mut c.dflow2d_to_msw_stage);
        }
    }

    /// MSW ↔ DFM-2D 是否启用
    pub fn surface_enabled(&self) -> bool {
        self.msw_surface.as_ref().is_some_and(|c| c.enable)
    }

    /// 已声明的通道组名称
    pub fn declared_groups(&self) -> Vec<&'static str> {
        let mut groups = Vec::new();
        if self.metamod.is_some() {
            groups.push("metamod");
        }
        if self.active_river.is_some() {
            groups.push("active_river");
        }
        if self.passive_river.is_some() {
            groups.push("passive_river");
        }
        if self.msw_river.is_some() {
            groups.push("msw_river");
        }
        if self.surface_enabled() {
            groups.push("msw_surface");
        }
        groups
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metamod() -> MetaModConfig {
        MetaModConfig {
            node_to_svat: PathBuf::from("exchanges/nodenr2svat.dxc"),
            recharge_to_svat: PathBuf::from("exchanges/rchindex2svat.dxc"),
            enable_sprinkling: false,
            sprinkling_to_svat: None,
            storage_coefficient: false,
        }
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = CouplingConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.declared_groups().is_empty());
    }

    #[test]
    fn test_sprinkling_requires_map() {
        let mut config = CouplingConfig {
            lookups: LookupConfig {
                svat: Some(PathBuf::from("mod2svat.inp")),
                ..Default::default()
            },
            metamod: Some(metamod()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        if let Some(m) = config.metamod.as_mut() {
            m.enable_sprinkling = true;
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_group_requires_lookup() {
        let config = CouplingConfig {
            metamod: Some(metamod()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));

        let config = CouplingConfig {
            passive_river: Some(PassiveRiverConfig {
                river_to_dflow1d_flux: PathBuf::from("riv2.dmm"),
                drainage_to_dflow1d_flux: PathBuf::from("drn.dmm"),
            }),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_disabled_surface_needs_no_lookup() {
        let config = CouplingConfig {
            msw_surface: Some(MswSurfaceConfig {
                enable: false,
                ponding_to_dflow2d_flux: PathBuf::from("pond.dmm"),
                dflow2d_to_msw_stage: PathBuf::from("stage.dmm"),
            }),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(!config.surface_enabled());
    }

    #[test]
    fn test_resolve_paths() {
        let mut config = CouplingConfig {
            lookups: LookupConfig {
                svat: Some(PathBuf::from("msw/mod2svat.inp")),
                dflow1d_points: Some(PathBuf::from("/abs/DFLOWFM1D_POINTS.DAT")),
                dflow2d_points: None,
            },
            metamod: Some(metamod()),
            ..Default::default()
        };
        config.resolve_paths(Path::new("/run"));
        assert_eq!(config.lookups.svat, Some(PathBuf::from("/run/msw/mod2svat.inp")));
        assert_eq!(
            config.lookups.dflow1d_points,
            Some(PathBuf::from("/abs/DFLOWFM1D_POINTS.DAT"))
        );
        let m = config.metamod.unwrap();
        assert_eq!(m.node_to_svat, PathBuf::from("/run/exchanges/nodenr2svat.dxc"));
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coupling.json");
        std::fs::write(
            &path,
            r#"{
                "lookups": { "dflow1d_points": "DFLOWFM1D_POINTS.DAT" },
                "active_river": {
                    "river_to_dflow1d_flux": "MFRIVTODFM1D_Q.DMM",
                    "dflow1d_to_river_stage": "DFM1DWATLEVTOMFRIV_H.DMM"
                }
            }"#,
        )
        .unwrap();

        let config = CouplingConfig::from_file(&path).unwrap();
        assert_eq!(config.declared_groups(), vec!["active_river"]);
        assert_eq!(
            config.lookups.dflow1d_points,
            Some(dir.path().join("DFLOWFM1D_POINTS.DAT"))
        );

        let saved = dir.path().join("saved.json");
        config.save_to_file(&saved).unwrap();
        let reloaded = CouplingConfig::from_file(&saved).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            CouplingConfig::from_file(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
