//! Board configuration
//!
//! Stored as YAML next to the clip database (default
//! `~/.config/jingle/config.yaml`). Presentation settings such as the tile
//! size live here rather than in the clip store.
//!
//! ```yaml
//! crossfade:
//!   enabled: true
//!   fade_seconds: 5
//!   curve: linear
//! display:
//!   tile_size: medium
//! storage:
//!   database_path: /home/me/.config/jingle/board.db
//! ```

mod io;
mod paths;

pub use io::{load_config, save_config};
pub use paths::{default_config_path, default_data_dir, default_database_path};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::crossfade::FadeCurve;
use crate::types::{TileSize, DEFAULT_FADE_SECONDS};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub crossfade: CrossfadeConfig,
    pub display: DisplayConfig,
    pub storage: StorageConfig,
}

/// Crossfade section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossfadeConfig {
    /// Clicking a tile while another plays fades between them
    pub enabled: bool,
    /// Fade length; zero falls back to the default
    pub fade_seconds: u32,
    pub curve: FadeCurve,
}

impl Default for CrossfadeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            fade_seconds: DEFAULT_FADE_SECONDS,
            curve: FadeCurve::Linear,
        }
    }
}

/// Display section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Column width of the tile grid
    pub tile_size: TileSize,
}

/// Storage section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Clip database location; `None` uses [`default_database_path`]
    pub database_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}
