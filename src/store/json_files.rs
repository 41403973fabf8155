use super::{
    graph_from_stored_edges, GraphStore, StateStore, DEPENDENCIES_DIR_NAME, GRAPH_FILE_NAME,
    TASKS_DIR_NAME,
};
use crate::engine::WorkflowState;
use crate::graph::{DependencyEdge, DependencyGraph};
use crate::shared::errors::{io_error, json_error, EngineError};
use crate::shared::fs_atomic::{atomic_write_file, is_temp_file_name};
use crate::shared::ids::TaskId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One pretty-printed JSON document per task under `<state_root>/tasks`.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    tasks_dir: PathBuf,
}

impl FileStateStore {
    pub fn new(state_root: &Path) -> Self {
        Self {
            tasks_dir: state_root.join(TASKS_DIR_NAME),
        }
    }

    pub fn record_path(&self, task_id: &TaskId) -> PathBuf {
        self.tasks_dir.join(format!("{task_id}.json"))
    }
}

impl StateStore for FileStateStore {
    fn load(&self, task_id: &TaskId) -> Result<Option<WorkflowState>, EngineError> {
        let path = self.record_path(task_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(&path, err)),
        };
        let state: WorkflowState = serde_json::from_str(&raw).map_err(|e| json_error(&path, e))?;
        if &state.task_id != task_id {
            return Err(EngineError::CorruptRecord {
                path: path.display().to_string(),
                reason: format!("record belongs to task `{}`", state.task_id),
            });
        }
        Ok(Some(state))
    }

    fn save(&self, state: &WorkflowState) -> Result<(), EngineError> {
        let path = self.record_path(&state.task_id);
        let body = serde_json::to_vec_pretty(state).map_err(|e| json_error(&path, e))?;
        atomic_write_file(&path, &body).map_err(|e| io_error(&path, e))
    }

    fn task_ids(&self) -> Result<Vec<TaskId>, EngineError> {
        let entries = match fs::read_dir(&self.tasks_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error(&self.tasks_dir, err)),
        };
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(&self.tasks_dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if is_temp_file_name(name) {
                continue;
            }
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            if let Ok(task_id) = TaskId::parse(stem) {
                ids.push(task_id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn contains(&self, task_id: &TaskId) -> Result<bool, EngineError> {
        Ok(self.record_path(task_id).is_file())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    edges: Vec<DependencyEdge>,
}

/// The whole graph as `{ "edges": [...] }` in `<state_root>/dependencies/graph.json`.
#[derive(Debug, Clone)]
pub struct FileGraphStore {
    path: PathBuf,
}

impl FileGraphStore {
    pub fn new(state_root: &Path) -> Self {
        Self {
            path: state_root.join(DEPENDENCIES_DIR_NAME).join(GRAPH_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GraphStore for FileGraphStore {
    fn load(&self) -> Result<DependencyGraph, EngineError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(DependencyGraph::new()),
            Err(err) => return Err(io_error(&self.path, err)),
        };
        let document: GraphDocument =
            serde_json::from_str(&raw).map_err(|e| json_error(&self.path, e))?;
        graph_from_stored_edges(&self.path, document.edges)
    }

    fn save(&self, graph: &DependencyGraph) -> Result<(), EngineError> {
        let document = GraphDocument {
            edges: graph.edges().to_vec(),
        };
        let body = serde_json::to_vec_pretty(&document).map_err(|e| json_error(&self.path, e))?;
        atomic_write_file(&self.path, &body).map_err(|e| io_error(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn missing_record_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStateStore::new(dir.path());
        let task_id = TaskId::parse("AL-1").expect("id");
        assert!(store.load(&task_id).expect("load").is_none());
        assert!(store.task_ids().expect("ids").is_empty());
    }

    #[test]
    fn record_under_wrong_file_name_is_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStateStore::new(dir.path());
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("ts");
        let state = WorkflowState::new(TaskId::parse("AL-1").expect("id"), now);
        store.save(&state).expect("save");

        let other = TaskId::parse("AL-2").expect("id");
        fs::copy(
            store.record_path(&state.task_id),
            store.record_path(&other),
        )
        .expect("copy");
        let err = store.load(&other).expect_err("mismatched record");
        assert!(err.to_string().contains("belongs to task `AL-1`"));
    }

    #[test]
    fn temp_files_are_not_listed_as_tasks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStateStore::new(dir.path());
        fs::create_dir_all(dir.path().join(TASKS_DIR_NAME)).expect("mkdir");
        fs::write(
            dir.path().join(TASKS_DIR_NAME).join(".AL-1.json.tmp-1-2"),
            b"{}",
        )
        .expect("write temp");
        fs::write(dir.path().join(TASKS_DIR_NAME).join("notes.txt"), b"x").expect("write");
        assert!(store.task_ids().expect("ids").is_empty());
    }

    #[test]
    fn missing_graph_file_is_empty_graph() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileGraphStore::new(dir.path());
        assert!(store.load().expect("load").is_empty());
    }
}
