//! Durable persistence for workflow state records and the dependency graph.
//!
//! Both stores replace whole records. A write either lands completely or the
//! previous record stays in place.

pub mod json_files;
pub mod sqlite;

use crate::engine::WorkflowState;
use crate::graph::{DependencyEdge, DependencyGraph};
use crate::shared::errors::EngineError;
use crate::shared::ids::TaskId;
use std::path::Path;

pub use json_files::{FileGraphStore, FileStateStore};
pub use sqlite::{SqliteGraphStore, SqliteStateStore, DATABASE_FILE_NAME};

pub const TASKS_DIR_NAME: &str = "tasks";
pub const DEPENDENCIES_DIR_NAME: &str = "dependencies";
pub const GRAPH_FILE_NAME: &str = "graph.json";

pub trait StateStore: Send + Sync {
    fn load(&self, task_id: &TaskId) -> Result<Option<WorkflowState>, EngineError>;

    fn save(&self, state: &WorkflowState) -> Result<(), EngineError>;

    /// Ids with a stored record, sorted.
    fn task_ids(&self) -> Result<Vec<TaskId>, EngineError>;

    fn contains(&self, task_id: &TaskId) -> Result<bool, EngineError> {
        Ok(self.load(task_id)?.is_some())
    }
}

pub trait GraphStore: Send + Sync {
    /// An absent graph loads as empty.
    fn load(&self) -> Result<DependencyGraph, EngineError>;

    fn save(&self, graph: &DependencyGraph) -> Result<(), EngineError>;
}

/// A stored edge that fails validation makes the whole graph record corrupt.
fn graph_from_stored_edges(
    path: &Path,
    edges: Vec<DependencyEdge>,
) -> Result<DependencyGraph, EngineError> {
    DependencyGraph::from_edges(edges).map_err(|err| EngineError::CorruptRecord {
        path: path.display().to_string(),
        reason: format!("stored dependency edge rejected: {err}"),
    })
}
