use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub behavior: BehaviorConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Delay before typed filter input is applied, in milliseconds
    pub filter_debounce_ms: u64,

    /// Maximum undo/redo entries kept on each stack
    pub history_limit: usize,

    /// Non-empty values sampled per column during type inference
    pub inference_sample_size: usize,

    /// Extra rows/columns materialized beyond the viewport
    pub overscan: usize,

    /// Milliseconds an edited cell stays flagged for highlighting
    pub highlight_ttl_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Default column width in pixels
    pub default_column_width: u32,

    /// Minimum column width in pixels
    pub min_column_width: u32,

    /// Maximum column width in pixels
    pub max_column_width: u32,

    /// Estimated row height in pixels for windowing
    pub row_height: u32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            filter_debounce_ms: 300,
            history_limit: 50,
            inference_sample_size: 100,
            overscan: 2,
            highlight_ttl_ms: 1000,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_column_width: 150,
            min_column_width: 50,
            max_column_width: 500,
            row_height: 32,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            behavior: BehaviorConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tabgrid").join("config.toml"))
    }

    /// Load from the platform config dir, falling back to defaults.
    /// A malformed file is reported and ignored rather than fatal.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Ignoring malformed config {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("no config directory on this platform"))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}
