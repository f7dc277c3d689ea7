//! Build configuration.
//!
//! Two options affect the build: the tile directory and an optional
//! elevation data directory. Everything else about the hierarchy
//! (levels, grids, cutoffs) is fixed by the tile format.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub hierarchy: HierarchySettings,
    #[serde(default)]
    pub additional_data: AdditionalData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HierarchySettings {
    /// Root directory holding the binary tiles, one subdirectory per
    /// level.
    pub tile_dir: PathBuf,
    /// Optional tile cache byte budget; the built-in default applies
    /// when unset.
    #[serde(default)]
    pub cache_budget_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdditionalData {
    /// Directory of .hgt elevation tiles; grades are flat without it.
    #[serde(default)]
    pub elevation: Option<PathBuf>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Config> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config with just a tile directory and defaults elsewhere.
    pub fn with_tile_dir(tile_dir: &Path) -> Config {
        Config {
            hierarchy: HierarchySettings {
                tile_dir: tile_dir.to_path_buf(),
                cache_budget_bytes: None,
            },
            additional_data: AdditionalData::default(),
        }
    }
}
