use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::raster::Compression;

/// Overview decimation factors used when `[geotiff].overview_factors` is absent.
pub const DEFAULT_OVERVIEW_FACTORS: [u32; 4] = [2, 4, 8, 16];

/// FTP session parameters (optional `[ftp]` section in config.toml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FtpConfig {
    /// Connect timeout in seconds (None = libcurl default, no explicit limit).
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Log the FTP command/reply dialogue at debug level.
    #[serde(default)]
    pub verbose: bool,
}

/// GeoTIFF output parameters (optional `[geotiff]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoTiffConfig {
    /// Strip compression: "none" (default), "lzw" or "deflate".
    #[serde(default)]
    pub compression: Compression,
    /// Build reduced-resolution overview IFDs after the full image.
    #[serde(default)]
    pub overviews: bool,
    /// Decimation factors for overview levels.
    #[serde(default = "default_overview_factors")]
    pub overview_factors: Vec<u32>,
}

fn default_overview_factors() -> Vec<u32> {
    DEFAULT_OVERVIEW_FACTORS.to_vec()
}

impl Default for GeoTiffConfig {
    fn default() -> Self {
        Self {
            compression: Compression::None,
            overviews: false,
            overview_factors: default_overview_factors(),
        }
    }
}

/// Global configuration loaded from `~/.config/geofetch/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeofetchConfig {
    /// Folder that FTP downloads are saved into (None = current directory).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub ftp: FtpConfig,
    #[serde(default)]
    pub geotiff: GeoTiffConfig,
}

impl GeofetchConfig {
    /// Download folder: configured `output_dir`, else the current directory.
    pub fn resolve_output_dir(&self) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("cannot determine current directory"),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("geofetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<GeofetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = GeofetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: GeofetchConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
