use super::{graph_from_stored_edges, GraphStore, StateStore};
use crate::engine::WorkflowState;
use crate::graph::{DependencyEdge, DependencyGraph, RelationType};
use crate::shared::errors::{io_error, json_error, sqlite_error, EngineError};
use crate::shared::ids::TaskId;
use crate::shared::metadata::Metadata;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};

pub const DATABASE_FILE_NAME: &str = "workstate.db";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS workflow_states (
        task_id TEXT PRIMARY KEY NOT NULL,
        workflow_id TEXT,
        body TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS dependency_edges (
        position INTEGER PRIMARY KEY NOT NULL,
        from_task TEXT NOT NULL,
        to_task TEXT NOT NULL,
        relation_type TEXT NOT NULL,
        metadata TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_dependency_edges_from
        ON dependency_edges(from_task);
    CREATE INDEX IF NOT EXISTS idx_dependency_edges_to
        ON dependency_edges(to_task);
";

/// Shared handle to `<state_root>/workstate.db`. Each operation opens its own
/// connection.
#[derive(Debug, Clone)]
struct Database {
    path: PathBuf,
}

impl Database {
    fn open(state_root: &Path) -> Result<Self, EngineError> {
        fs::create_dir_all(state_root).map_err(|e| io_error(state_root, e))?;
        let database = Self {
            path: state_root.join(DATABASE_FILE_NAME),
        };
        let connection = database.connect()?;
        connection
            .execute_batch(SCHEMA)
            .map_err(|e| sqlite_error(&database.path, e))?;
        Ok(database)
    }

    fn connect(&self) -> Result<Connection, EngineError> {
        let connection = Connection::open(&self.path).map_err(|e| sqlite_error(&self.path, e))?;
        connection
            .execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")
            .map_err(|e| sqlite_error(&self.path, e))?;
        Ok(connection)
    }
}

#[derive(Debug, Clone)]
pub struct SqliteStateStore {
    database: Database,
}

impl SqliteStateStore {
    pub fn open(state_root: &Path) -> Result<Self, EngineError> {
        Ok(Self {
            database: Database::open(state_root)?,
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.database.path
    }
}

impl StateStore for SqliteStateStore {
    fn load(&self, task_id: &TaskId) -> Result<Option<WorkflowState>, EngineError> {
        let path = &self.database.path;
        let connection = self.database.connect()?;
        let body: Option<String> = connection
            .query_row(
                "SELECT body FROM workflow_states WHERE task_id = ?1",
                params![task_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| sqlite_error(path, e))?;
        let Some(body) = body else {
            return Ok(None);
        };
        let state: WorkflowState = serde_json::from_str(&body).map_err(|e| json_error(path, e))?;
        if &state.task_id != task_id {
            return Err(EngineError::CorruptRecord {
                path: format!("{}#{task_id}", path.display()),
                reason: format!("record belongs to task `{}`", state.task_id),
            });
        }
        Ok(Some(state))
    }

    fn save(&self, state: &WorkflowState) -> Result<(), EngineError> {
        let path = &self.database.path;
        let body = serde_json::to_string(state).map_err(|e| json_error(path, e))?;
        let connection = self.database.connect()?;
        connection
            .execute(
                "
                INSERT INTO workflow_states (task_id, workflow_id, body, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(task_id) DO UPDATE SET
                    workflow_id = excluded.workflow_id,
                    body = excluded.body,
                    updated_at = excluded.updated_at
                ",
                params![
                    state.task_id.as_str(),
                    state.workflow_id.as_ref().map(|id| id.as_str()),
                    body,
                    state.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| sqlite_error(path, e))?;
        Ok(())
    }

    fn task_ids(&self) -> Result<Vec<TaskId>, EngineError> {
        let path = &self.database.path;
        let connection = self.database.connect()?;
        let mut statement = connection
            .prepare("SELECT task_id FROM workflow_states ORDER BY task_id")
            .map_err(|e| sqlite_error(path, e))?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| sqlite_error(path, e))?;
        let mut ids = Vec::new();
        for row in rows {
            let raw = row.map_err(|e| sqlite_error(path, e))?;
            let task_id = TaskId::parse(&raw).map_err(|reason| EngineError::CorruptRecord {
                path: path.display().to_string(),
                reason,
            })?;
            ids.push(task_id);
        }
        Ok(ids)
    }

    fn contains(&self, task_id: &TaskId) -> Result<bool, EngineError> {
        let path = &self.database.path;
        let connection = self.database.connect()?;
        connection
            .query_row(
                "SELECT 1 FROM workflow_states WHERE task_id = ?1",
                params![task_id.as_str()],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
            .map_err(|e| sqlite_error(path, e))
    }
}

#[derive(Debug, Clone)]
pub struct SqliteGraphStore {
    database: Database,
}

impl SqliteGraphStore {
    pub fn open(state_root: &Path) -> Result<Self, EngineError> {
        Ok(Self {
            database: Database::open(state_root)?,
        })
    }
}

impl GraphStore for SqliteGraphStore {
    fn load(&self) -> Result<DependencyGraph, EngineError> {
        let path = &self.database.path;
        let connection = self.database.connect()?;
        let mut statement = connection
            .prepare(
                "SELECT from_task, to_task, relation_type, metadata
                 FROM dependency_edges ORDER BY position",
            )
            .map_err(|e| sqlite_error(path, e))?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .map_err(|e| sqlite_error(path, e))?;

        let mut edges = Vec::new();
        for row in rows {
            let (from_task, to_task, relation_type, metadata) =
                row.map_err(|e| sqlite_error(path, e))?;
            edges.push(edge_from_row(path, &from_task, &to_task, &relation_type, metadata)?);
        }
        graph_from_stored_edges(path, edges)
    }

    fn save(&self, graph: &DependencyGraph) -> Result<(), EngineError> {
        let path = &self.database.path;
        let mut connection = self.database.connect()?;
        let tx = connection.transaction().map_err(|e| sqlite_error(path, e))?;
        tx.execute("DELETE FROM dependency_edges", [])
            .map_err(|e| sqlite_error(path, e))?;
        for (position, edge) in graph.edges().iter().enumerate() {
            let metadata = if edge.metadata.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&edge.metadata).map_err(|e| json_error(path, e))?)
            };
            tx.execute(
                "
                INSERT INTO dependency_edges (position, from_task, to_task, relation_type, metadata)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
                params![
                    position as i64,
                    edge.from_task.as_str(),
                    edge.to_task.as_str(),
                    edge.relation_type.as_str(),
                    metadata,
                ],
            )
            .map_err(|e| sqlite_error(path, e))?;
        }
        tx.commit().map_err(|e| sqlite_error(path, e))
    }
}

fn edge_from_row(
    path: &Path,
    from_task: &str,
    to_task: &str,
    relation_type: &str,
    metadata: Option<String>,
) -> Result<DependencyEdge, EngineError> {
    let corrupt = |reason: String| EngineError::CorruptRecord {
        path: path.display().to_string(),
        reason,
    };
    let from_task = TaskId::parse(from_task).map_err(corrupt)?;
    let to_task = TaskId::parse(to_task).map_err(corrupt)?;
    let relation_type = RelationType::parse(relation_type).map_err(|e| corrupt(e.to_string()))?;
    let metadata = match metadata {
        Some(raw) => serde_json::from_str::<Metadata>(&raw).map_err(|e| json_error(path, e))?,
        None => Metadata::default(),
    };
    Ok(DependencyEdge::new(from_task, to_task, relation_type).with_metadata(metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn upsert_replaces_the_whole_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteStateStore::open(dir.path()).expect("open");
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("ts");
        let task_id = TaskId::parse("AL-1").expect("id");

        let mut state = WorkflowState::new(task_id.clone(), now);
        store.save(&state).expect("insert");
        state.artifacts.insert("pr".to_string(), "42".to_string());
        store.save(&state).expect("update");

        let loaded = store.load(&task_id).expect("load").expect("present");
        assert_eq!(loaded.artifacts.get("pr").map(String::as_str), Some("42"));
        assert_eq!(store.task_ids().expect("ids"), vec![task_id.clone()]);
        assert!(store.contains(&task_id).expect("contains"));
        assert!(dir.path().join(DATABASE_FILE_NAME).is_file());
    }

    #[test]
    fn unknown_relation_type_in_row_is_corrupt() {
        let err = edge_from_row(Path::new("db"), "A", "B", "PARENT", None).expect_err("corrupt");
        assert_eq!(err.kind(), crate::shared::ErrorKind::Storage);
    }
}
