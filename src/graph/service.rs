use super::dependency_graph::{DependencyGraph, TaskRelationships};
use super::edge::{DependencyEdge, RelationType};
use super::task_directory::TaskDirectory;
use crate::shared::errors::EngineError;
use crate::shared::ids::TaskId;
use crate::shared::keyed_lock::lock_ignoring_poison;
use crate::shared::metadata::Metadata;
use crate::store::GraphStore;
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnlinkOutcome {
    Removed { edge: DependencyEdge },
    NoRelationship { task_a: String, task_b: String },
}

/// Read-modify-write access to the persisted graph.
///
/// Task existence is checked before the graph lock is taken; the graph is
/// written back only when the mutation validated.
pub struct DependencyService {
    store: Arc<dyn GraphStore>,
    tasks: Arc<dyn TaskDirectory>,
    lock: Mutex<()>,
}

impl DependencyService {
    pub fn new(store: Arc<dyn GraphStore>, tasks: Arc<dyn TaskDirectory>) -> Self {
        Self {
            store,
            tasks,
            lock: Mutex::new(()),
        }
    }

    pub fn link(
        &self,
        blocker: &str,
        blocked: &str,
        relation_type: &str,
        metadata: Option<Metadata>,
    ) -> Result<DependencyEdge, EngineError> {
        let blocker = parse_task_id(blocker)?;
        let blocked = parse_task_id(blocked)?;
        let relation_type = RelationType::parse(relation_type)?;
        if blocker == blocked {
            return Err(EngineError::SelfLink {
                task_id: blocker.to_string(),
            });
        }
        self.require_task(&blocker)?;
        self.require_task(&blocked)?;

        let edge = DependencyEdge::new(blocker, blocked, relation_type)
            .with_metadata(metadata.unwrap_or_default());
        let _guard = lock_ignoring_poison(&self.lock);
        let mut graph = self.store.load()?;
        let linked = graph.link(edge)?.clone();
        self.store.save(&graph)?;
        tracing::info!(
            from_task = %linked.from_task,
            to_task = %linked.to_task,
            relation_type = %linked.relation_type,
            "linked tasks"
        );
        Ok(linked)
    }

    pub fn unlink(
        &self,
        task_a: &str,
        task_b: &str,
        relation_type: Option<&str>,
    ) -> Result<UnlinkOutcome, EngineError> {
        let task_a = parse_task_id(task_a)?;
        let task_b = parse_task_id(task_b)?;
        let relation_type = relation_type.map(RelationType::parse).transpose()?;
        self.require_task(&task_a)?;
        self.require_task(&task_b)?;

        let _guard = lock_ignoring_poison(&self.lock);
        let mut graph = self.store.load()?;
        let Some(edge) = graph.unlink(task_a.as_str(), task_b.as_str(), relation_type) else {
            tracing::debug!(task_a = %task_a, task_b = %task_b, "no relationship to unlink");
            return Ok(UnlinkOutcome::NoRelationship {
                task_a: task_a.to_string(),
                task_b: task_b.to_string(),
            });
        };
        self.store.save(&graph)?;
        tracing::info!(
            from_task = %edge.from_task,
            to_task = %edge.to_task,
            relation_type = %edge.relation_type,
            "unlinked tasks"
        );
        Ok(UnlinkOutcome::Removed { edge })
    }

    pub fn relationships(&self, task_id: &str) -> Result<TaskRelationships, EngineError> {
        let task_id = parse_task_id(task_id)?;
        Ok(self.graph()?.relationships(task_id.as_str()))
    }

    pub fn graph(&self) -> Result<DependencyGraph, EngineError> {
        let _guard = lock_ignoring_poison(&self.lock);
        self.store.load()
    }

    fn require_task(&self, task_id: &TaskId) -> Result<(), EngineError> {
        if self.tasks.exists(task_id)? {
            Ok(())
        } else {
            Err(EngineError::MissingTask {
                task_id: task_id.to_string(),
            })
        }
    }
}

fn parse_task_id(raw: &str) -> Result<TaskId, EngineError> {
    TaskId::parse(raw).map_err(|reason| EngineError::invalid_id(TaskId::KIND, raw, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::StaticTaskDirectory;
    use crate::shared::errors::ErrorKind;
    use crate::store::FileGraphStore;

    fn service(dir: &std::path::Path, known: &[&str]) -> DependencyService {
        DependencyService::new(
            Arc::new(FileGraphStore::new(dir)),
            Arc::new(StaticTaskDirectory::new(
                known.iter().map(|raw| TaskId::parse(raw).expect("id")),
            )),
        )
    }

    #[test]
    fn self_link_is_rejected_even_for_unknown_tasks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service(dir.path(), &[]);
        let err = service.link("A", "A", "BLOCKS", None).expect_err("self link");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn unknown_task_is_not_found_and_graph_is_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service(dir.path(), &["A"]);
        let err = service.link("A", "B", "BLOCKS", None).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!dir.path().join("dependencies").exists());
    }

    #[test]
    fn unlink_without_relationship_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service(dir.path(), &["A", "B"]);
        let outcome = service.unlink("A", "B", None).expect("unlink");
        assert!(matches!(outcome, UnlinkOutcome::NoRelationship { .. }));
    }

    #[test]
    fn link_persists_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service(dir.path(), &["A", "B"]);
        let metadata = Metadata::parse(r#"{"source":"triage"}"#).expect("metadata");
        service
            .link("A", "B", "relates", Some(metadata))
            .expect("link");
        let graph = service.graph().expect("graph");
        assert_eq!(graph.edges()[0].metadata.source(), Some("triage"));
    }
}
