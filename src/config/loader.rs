// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize a TOML config file without validating its values.
///
/// Use [`load_and_validate`] unless you need to inspect invalid values.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Read, deserialize and validate a config file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "Dagflow.toml";

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Pick the config file to load.
///
/// An explicit path is always returned, so a missing file surfaces as an
/// I/O error. Otherwise `default` is used only if it exists, and `None`
/// means "run with built-in defaults".
pub fn resolve_config_path(explicit: Option<&str>, default: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(PathBuf::from(path)),
        None if default.is_file() => Some(default.to_path_buf()),
        None => {
            debug!(path = %default.display(), "no config file found; using defaults");
            None
        }
    }
}

/// Load the resolved config file, or defaults when there is none.
pub fn load_or_default(explicit: Option<&str>, default: &Path) -> Result<ConfigFile> {
    match resolve_config_path(explicit, default) {
        Some(path) => load_and_validate(path),
        None => Ok(ConfigFile::default()),
    }
}
