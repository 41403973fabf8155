use super::paths::{DEFAULT_STATE_DIR_NAME, DEFAULT_WORKFLOWS_FILE_NAME};
use super::{ConfigError, WorkflowId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Json,
    Sqlite,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How dependency operations decide whether a task id refers to a real task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskDirectoryMode {
    /// Every well-formed id is accepted.
    #[default]
    Open,
    /// Only tasks with recorded workflow state exist.
    Tracked,
}

impl TaskDirectoryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Tracked => "tracked",
        }
    }
}

impl std::fmt::Display for TaskDirectoryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_workflows_path() -> PathBuf {
    PathBuf::from(DEFAULT_WORKFLOWS_FILE_NAME)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_root: Option<PathBuf>,
    #[serde(default = "default_workflows_path")]
    pub workflows_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subagents_path: Option<PathBuf>,
    #[serde(default)]
    pub store: StoreBackend,
    #[serde(default)]
    pub task_directory: TaskDirectoryMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_workflow: Option<String>,
    /// Directory relative paths resolve against; the settings file's parent.
    #[serde(skip)]
    pub config_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_root: None,
            workflows_path: default_workflows_path(),
            subagents_path: None,
            store: StoreBackend::default(),
            task_directory: TaskDirectoryMode::default(),
            default_workflow: None,
            config_dir: PathBuf::new(),
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut settings: Settings =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        settings.config_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workflows_path.as_os_str().is_empty() {
            return Err(ConfigError::Settings(
                "`workflows_path` must be non-empty".to_string(),
            ));
        }
        if let Some(path) = &self.state_root {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Settings(
                    "`state_root` must be non-empty when set".to_string(),
                ));
            }
        }
        if let Some(workflow_id) = &self.default_workflow {
            WorkflowId::parse(workflow_id)
                .map_err(|err| ConfigError::Settings(format!("`default_workflow`: {err}")))?;
        }
        Ok(())
    }

    pub fn default_workflow_id(&self) -> Option<WorkflowId> {
        self.default_workflow
            .as_deref()
            .and_then(|raw| WorkflowId::parse(raw).ok())
    }

    pub fn resolve_state_root(&self) -> PathBuf {
        match &self.state_root {
            Some(path) => self.resolve(path),
            None => self.config_dir.join(DEFAULT_STATE_DIR_NAME),
        }
    }

    pub fn resolve_workflows_path(&self) -> PathBuf {
        self.resolve(&self.workflows_path)
    }

    pub fn resolve_subagents_path(&self) -> Option<PathBuf> {
        self.subagents_path.as_deref().map(|path| self.resolve(path))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let mut settings: Settings = serde_yaml::from_str(
            r#"
workflows_path: defs/workflows.yaml
subagents_path: /etc/workstate/subagents.yaml
store: sqlite
"#,
        )
        .expect("parse settings");
        settings.config_dir = PathBuf::from("/srv/workstate");

        assert_eq!(
            settings.resolve_workflows_path(),
            PathBuf::from("/srv/workstate/defs/workflows.yaml")
        );
        assert_eq!(
            settings.resolve_subagents_path(),
            Some(PathBuf::from("/etc/workstate/subagents.yaml"))
        );
        assert_eq!(
            settings.resolve_state_root(),
            PathBuf::from("/srv/workstate/state")
        );
        assert_eq!(settings.store, StoreBackend::Sqlite);
        assert_eq!(settings.task_directory, TaskDirectoryMode::Open);
    }

    #[test]
    fn unknown_store_backend_is_a_parse_error() {
        let err = serde_yaml::from_str::<Settings>("store: postgres\n").expect_err("invalid store");
        assert!(err.to_string().contains("unknown variant"));
    }

    #[test]
    fn invalid_default_workflow_fails_validation() {
        let settings: Settings =
            serde_yaml::from_str("default_workflow: not a workflow\n").expect("parse");
        match settings.validate().expect_err("validation should fail") {
            ConfigError::Settings(message) => assert!(message.contains("default_workflow")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
