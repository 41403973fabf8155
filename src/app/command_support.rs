use crate::app::cli::GlobalOptions;
use crate::config::{default_global_config_path, load_settings_from, ConfigError, Settings};
use crate::shared::errors::EngineError;
use crate::workspace::Workspace;
use serde::Serialize;
use std::path::PathBuf;

/// Per-invocation CLI context resolved from global options.
#[derive(Debug, Clone, Default)]
pub struct CliContext {
    pub config_path: Option<PathBuf>,
}

impl CliContext {
    pub fn from_options(options: &GlobalOptions) -> Self {
        Self {
            config_path: options.config_path.clone(),
        }
    }

    pub fn config_path(&self) -> Result<PathBuf, String> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => default_global_config_path().map_err(map_config_err),
        }
    }
}

pub fn map_config_err(err: ConfigError) -> String {
    err.to_string()
}

/// Prefixes the error kind so scripted callers can branch on it.
pub fn map_engine_err(err: EngineError) -> String {
    format!("{}: {err}", err.kind())
}

pub fn load_settings(context: &CliContext) -> Result<Settings, String> {
    let path = context.config_path()?;
    if !path.exists() {
        return Err(format!(
            "config file not found at {}; run `workstate init` first",
            path.display()
        ));
    }
    load_settings_from(&path).map_err(map_config_err)
}

pub fn open_workspace(context: &CliContext) -> Result<Workspace, String> {
    let settings = load_settings(context)?;
    Workspace::open(settings).map_err(map_engine_err)
}

pub fn render_yaml<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String, String> {
    serde_yaml::to_string(value)
        .map(|body| body.trim_end().to_string())
        .map_err(|e| format!("failed to encode {what}: {e}"))
}

pub fn render_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("failed to encode {what}: {e}"))
}

/// Renders `key=value` lines in the given order.
pub fn render_fields(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
