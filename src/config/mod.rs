pub mod error;
pub mod load;
pub mod paths;
pub mod save;
pub mod settings;
pub mod subagent_file;
pub mod workflow_file;

pub use crate::shared::ids::{SubagentId, TaskId, WorkflowId};
pub use error::ConfigError;
pub use load::{load_global_settings, load_settings_from};
pub use paths::{
    default_global_config_path, DEFAULT_STATE_DIR_NAME, DEFAULT_SUBAGENTS_FILE_NAME,
    DEFAULT_WORKFLOWS_FILE_NAME, GLOBAL_SETTINGS_FILE_NAME, GLOBAL_STATE_DIR,
};
pub use save::{save_settings, write_config_file_if_missing};
pub use settings::{Settings, StoreBackend, TaskDirectoryMode};
pub use subagent_file::{load_subagents, parse_subagent_document, Subagent};
pub use workflow_file::{
    load_workflow_definitions, parse_workflow_document, validate_workflow_set, Phase,
    WorkflowDefinition,
};
