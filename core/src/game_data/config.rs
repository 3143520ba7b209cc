//! Configuration loading for the game-data reference tables.
//!
//! Definitions are loaded from TOML files in two locations:
//! - **Builtin**: shipped with the application (read-only)
//! - **Custom**: user-supplied overrides
//!
//! A file that fails to parse is logged and skipped; the rest of the
//! directory still loads.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use super::{GameData, GameDataConfig};

/// Load reference tables from builtin and custom config directories.
///
/// Builtin definitions load first; custom definitions with the same id
/// override them.
pub fn load_game_data(
    builtin_dir: Option<&Path>,
    custom_dir: Option<&Path>,
) -> Result<GameData, ConfigError> {
    let mut data = GameData::new();

    if let Some(dir) = builtin_dir
        && dir.exists()
    {
        load_directory(&mut data, dir, "builtin")?;
    }

    if let Some(dir) = custom_dir
        && dir.exists()
    {
        load_directory(&mut data, dir, "custom")?;
    }

    Ok(data)
}

fn load_directory(data: &mut GameData, dir: &Path, source: &str) -> Result<(), ConfigError> {
    let entries = fs::read_dir(dir).map_err(|e| ConfigError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();

        if path.extension().is_some_and(|ext| ext == "toml") {
            match load_file(&path) {
                Ok(config) => {
                    let duplicates = data.add_config(config);
                    if !duplicates.is_empty() {
                        warn!(source, file = ?path.file_name(), ?duplicates, "duplicate definition ids");
                    }
                }
                Err(e) => {
                    warn!(source, file = ?path.file_name(), error = %e, "failed to load definitions");
                }
            }
        }
    }

    Ok(())
}

/// Load a single TOML definitions file.
pub fn load_file(path: &Path) -> Result<GameDataConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Default directory for user-supplied definition overrides.
pub fn default_custom_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tomestone").join("definitions"))
}

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
