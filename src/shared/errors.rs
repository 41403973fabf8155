use crate::config::ConfigError;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Validation,
    NotFound,
    Conflict,
    CycleDetected,
    Storage,
    Collaborator,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::CycleDetected => "cycle_detected",
            Self::Storage => "storage",
            Self::Collaborator => "collaborator",
        }
    }

    /// Outcomes a caller handles as ordinary control flow.
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::Conflict | Self::CycleDetected)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),
    #[error("workflow definitions are unavailable: {reason}")]
    DefinitionsUnavailable { reason: String },
    #[error("invalid {kind} `{value}`: {reason}")]
    InvalidId {
        kind: &'static str,
        value: String,
        reason: String,
    },
    #[error("context for task `{task_id}` phase `{phase}` must have non-empty content")]
    EmptyContent { task_id: String, phase: String },
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("phase `{phase}` is not part of workflow `{workflow_id}`")]
    UnknownPhase { workflow_id: String, phase: String },
    #[error("phase `{phase}` is not declared by any workflow")]
    UndeclaredPhase { phase: String },
    #[error("task `{task_id}` has no workflow assigned")]
    WorkflowNotAssigned { task_id: String },
    #[error("task `{task_id}` cannot be related to itself")]
    SelfLink { task_id: String },
    #[error("invalid relation type `{0}`; expected BLOCKS, RELATES or DUPLICATES")]
    InvalidRelationType(String),
    #[error("no workflow state recorded for task `{task_id}`")]
    UnknownTask { task_id: String },
    #[error("unknown workflow `{workflow_id}`")]
    UnknownWorkflow { workflow_id: String },
    #[error("task `{task_id}` does not exist")]
    MissingTask { task_id: String },
    #[error(
        "task `{task_id}` already runs workflow `{assigned}`; reassign explicitly to switch to `{requested}`"
    )]
    WorkflowAlreadyAssigned {
        task_id: String,
        assigned: String,
        requested: String,
    },
    #[error("relationship `{from_task}` {relation} `{to_task}` already exists")]
    DuplicateEdge {
        from_task: String,
        to_task: String,
        relation: String,
    },
    #[error(
        "`{blocker}` blocking `{blocked}` would close a cycle: {}",
        .path.join(" -> ")
    )]
    CycleDetected {
        blocker: String,
        blocked: String,
        path: Vec<String>,
    },
    #[error("task lookup failed for `{task_id}`: {reason}")]
    TaskLookup { task_id: String, reason: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("json error at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("sqlite error at {path}: {source}")]
    Sqlite {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("stored record at {path} is invalid: {reason}")]
    CorruptRecord { path: String, reason: String },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::DefinitionsUnavailable { .. } => ErrorKind::Configuration,
            Self::InvalidId { .. }
            | Self::EmptyContent { .. }
            | Self::InvalidMetadata(_)
            | Self::UnknownPhase { .. }
            | Self::UndeclaredPhase { .. }
            | Self::WorkflowNotAssigned { .. }
            | Self::SelfLink { .. }
            | Self::InvalidRelationType(_) => ErrorKind::Validation,
            Self::UnknownTask { .. } | Self::UnknownWorkflow { .. } | Self::MissingTask { .. } => {
                ErrorKind::NotFound
            }
            Self::WorkflowAlreadyAssigned { .. } | Self::DuplicateEdge { .. } => ErrorKind::Conflict,
            Self::CycleDetected { .. } => ErrorKind::CycleDetected,
            Self::TaskLookup { .. } => ErrorKind::Collaborator,
            Self::Io { .. }
            | Self::Json { .. }
            | Self::Sqlite { .. }
            | Self::CorruptRecord { .. } => ErrorKind::Storage,
        }
    }

    pub fn invalid_id(kind: &'static str, value: &str, reason: String) -> Self {
        Self::InvalidId {
            kind,
            value: value.to_string(),
            reason,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

pub(crate) fn io_error(path: &std::path::Path, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub(crate) fn json_error(path: &std::path::Path, source: serde_json::Error) -> EngineError {
    EngineError::Json {
        path: path.display().to_string(),
        source,
    }
}

pub(crate) fn sqlite_error(path: &std::path::Path, source: rusqlite::Error) -> EngineError {
    EngineError::Sqlite {
        path: path.display().to_string(),
        source,
    }
}
