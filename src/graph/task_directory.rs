use crate::shared::errors::EngineError;
use crate::shared::ids::TaskId;
use crate::store::StateStore;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Task-identity lookup consulted before dependency edges change.
///
/// `Ok(false)` means the task does not exist. Any other failure should be
/// reported as `EngineError::TaskLookup`.
pub trait TaskDirectory: Send + Sync {
    fn exists(&self, task_id: &TaskId) -> Result<bool, EngineError>;
}

/// Treats every well-formed id as an existing task.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenTaskDirectory;

impl TaskDirectory for OpenTaskDirectory {
    fn exists(&self, _task_id: &TaskId) -> Result<bool, EngineError> {
        Ok(true)
    }
}

/// A task exists once the state store holds a record for it.
#[derive(Clone)]
pub struct TrackedTaskDirectory {
    states: Arc<dyn StateStore>,
}

impl TrackedTaskDirectory {
    pub fn new(states: Arc<dyn StateStore>) -> Self {
        Self { states }
    }
}

impl TaskDirectory for TrackedTaskDirectory {
    fn exists(&self, task_id: &TaskId) -> Result<bool, EngineError> {
        self.states
            .contains(task_id)
            .map_err(|err| EngineError::TaskLookup {
                task_id: task_id.to_string(),
                reason: err.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticTaskDirectory {
    tasks: BTreeSet<TaskId>,
}

impl StaticTaskDirectory {
    pub fn new(tasks: impl IntoIterator<Item = TaskId>) -> Self {
        Self {
            tasks: tasks.into_iter().collect(),
        }
    }
}

impl TaskDirectory for StaticTaskDirectory {
    fn exists(&self, task_id: &TaskId) -> Result<bool, EngineError> {
        Ok(self.tasks.contains(task_id))
    }
}
