use crate::app::command_support::{map_config_err, render_fields, CliContext};
use crate::config::{
    save_settings, write_config_file_if_missing, Settings, DEFAULT_SUBAGENTS_FILE_NAME,
    DEFAULT_WORKFLOWS_FILE_NAME,
};
use crate::templates::{DEFAULT_SUBAGENTS_YAML, DEFAULT_WORKFLOWS_YAML};
use std::path::PathBuf;

/// Writes the settings file and default definition documents next to it.
/// Existing files are left untouched.
pub fn cmd_init(context: &CliContext) -> Result<String, String> {
    let config_path = context.config_path()?;
    let config_dir = config_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();

    let settings_written = if config_path.exists() {
        false
    } else {
        let settings = Settings {
            subagents_path: Some(PathBuf::from(DEFAULT_SUBAGENTS_FILE_NAME)),
            ..Settings::default()
        };
        save_settings(&settings, &config_path).map_err(map_config_err)?;
        true
    };
    let workflows_path = config_dir.join(DEFAULT_WORKFLOWS_FILE_NAME);
    let workflows_written = write_config_file_if_missing(&workflows_path, DEFAULT_WORKFLOWS_YAML)
        .map_err(map_config_err)?;
    let subagents_path = config_dir.join(DEFAULT_SUBAGENTS_FILE_NAME);
    let subagents_written = write_config_file_if_missing(&subagents_path, DEFAULT_SUBAGENTS_YAML)
        .map_err(map_config_err)?;

    Ok(render_fields(&[
        ("config", config_path.display().to_string()),
        ("config_written", settings_written.to_string()),
        ("workflows", workflows_path.display().to_string()),
        ("workflows_written", workflows_written.to_string()),
        ("subagents", subagents_path.display().to_string()),
        ("subagents_written", subagents_written.to_string()),
    ]))
}
