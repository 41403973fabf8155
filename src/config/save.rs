use super::{ConfigError, Settings};
use crate::shared::fs_atomic::atomic_write_file;
use std::fs;
use std::path::Path;

pub fn save_settings(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    let body = serde_yaml::to_string(settings).map_err(|source| ConfigError::Encode {
        path: path.display().to_string(),
        source,
    })?;
    write_config_file(path, body.as_bytes())
}

/// Writes a config document unless one already exists. Returns whether the
/// file was written.
pub fn write_config_file_if_missing(path: &Path, body: &str) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    write_config_file(path, body.as_bytes())?;
    Ok(true)
}

fn write_config_file(path: &Path, body: &[u8]) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }
    atomic_write_file(path, body).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })
}
