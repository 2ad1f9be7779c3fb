//! Reading and writing `config.yaml`
//!
//! The player rewrites the file whenever a toggle, the fade length or the
//! tile size changes, so writes go through a sibling temp file and a rename:
//! a crash mid-write leaves the previous config in place. A board must always
//! start, so anything wrong with the file on load falls back to defaults.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Read a config section tree, falling back to `T::default()`
///
/// ```ignore
/// let config: BoardConfig = load_config(&default_config_path());
/// ```
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("load_config: No config at {:?}, starting with defaults", path);
            return T::default();
        }
        Err(e) => {
            log::warn!("load_config: Cannot read {:?} ({}), using defaults", path, e);
            return T::default();
        }
    };

    serde_yaml::from_str::<T>(&contents).unwrap_or_else(|e| {
        log::warn!("load_config: {:?} is not valid config ({}), using defaults", path, e);
        T::default()
    })
}

/// Write the config, replacing the old file in one step
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    let staging = staging_path(path);
    std::fs::write(&staging, yaml)
        .with_context(|| format!("Failed to write {:?}", staging))?;
    std::fs::rename(&staging, path)
        .with_context(|| format!("Failed to move {:?} into place", staging))?;

    log::debug!("save_config: Wrote {:?}", path);
    Ok(())
}

/// `config.yaml` -> `config.yaml.tmp`, next to the target so rename stays on one filesystem
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
