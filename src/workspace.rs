use crate::config::{Settings, StoreBackend, TaskDirectoryMode};
use crate::definitions::{DefinitionStore, DefinitionWarning};
use crate::engine::WorkflowEngine;
use crate::graph::{DependencyService, OpenTaskDirectory, TaskDirectory, TrackedTaskDirectory};
use crate::shared::clock::Clock;
use crate::shared::errors::{io_error, EngineError};
use crate::store::{
    FileGraphStore, FileStateStore, GraphStore, SqliteGraphStore, SqliteStateStore, StateStore,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything one process needs: definitions, both stores, the engine and
/// the dependency service, wired from `Settings`.
pub struct Workspace {
    settings: Settings,
    state_root: PathBuf,
    engine: WorkflowEngine,
    dependencies: DependencyService,
    warnings: Vec<DefinitionWarning>,
}

impl Workspace {
    pub fn open(settings: Settings) -> Result<Self, EngineError> {
        Self::open_with_clock(settings, None)
    }

    pub fn open_with_clock(settings: Settings, clock: Option<Clock>) -> Result<Self, EngineError> {
        settings.validate()?;
        let state_root = settings.resolve_state_root();
        fs::create_dir_all(&state_root).map_err(|e| io_error(&state_root, e))?;

        let subagents_path = settings.resolve_subagents_path();
        let load = DefinitionStore::load(
            &settings.resolve_workflows_path(),
            subagents_path.as_deref(),
        );
        let definitions = Arc::new(load.store);

        let (states, graph) = open_stores(settings.store, &state_root)?;
        let tasks: Arc<dyn TaskDirectory> = match settings.task_directory {
            TaskDirectoryMode::Open => Arc::new(OpenTaskDirectory),
            TaskDirectoryMode::Tracked => Arc::new(TrackedTaskDirectory::new(Arc::clone(&states))),
        };

        let mut engine = WorkflowEngine::new(definitions, states)
            .with_default_workflow(settings.default_workflow_id());
        if let Some(clock) = clock {
            engine = engine.with_clock(clock);
        }
        tracing::debug!(
            state_root = %state_root.display(),
            store = %settings.store,
            task_directory = settings.task_directory.as_str(),
            "opened workspace"
        );

        Ok(Self {
            dependencies: DependencyService::new(graph, tasks),
            engine,
            state_root,
            warnings: load.warnings,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state_root(&self) -> &Path {
        &self.state_root
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub fn dependencies(&self) -> &DependencyService {
        &self.dependencies
    }

    /// Problems found while loading definitions.
    pub fn warnings(&self) -> &[DefinitionWarning] {
        &self.warnings
    }
}

fn open_stores(
    backend: StoreBackend,
    state_root: &Path,
) -> Result<(Arc<dyn StateStore>, Arc<dyn GraphStore>), EngineError> {
    match backend {
        StoreBackend::Json => Ok((
            Arc::new(FileStateStore::new(state_root)),
            Arc::new(FileGraphStore::new(state_root)),
        )),
        StoreBackend::Sqlite => Ok((
            Arc::new(SqliteStateStore::open(state_root)?),
            Arc::new(SqliteGraphStore::open(state_root)?),
        )),
    }
}
