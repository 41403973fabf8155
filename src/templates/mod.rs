pub mod default_workflows;

pub use default_workflows::{DEFAULT_SUBAGENTS_YAML, DEFAULT_WORKFLOWS_YAML};
