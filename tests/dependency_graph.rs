use std::sync::Arc;
use workstate::graph::{
    DependencyService, OpenTaskDirectory, StaticTaskDirectory, TaskDirectory,
    TrackedTaskDirectory, UnlinkOutcome,
};
use workstate::shared::{EngineError, ErrorKind, Metadata, TaskId};
use workstate::store::{FileGraphStore, FileStateStore, GraphStore, SqliteGraphStore};

fn task(raw: &str) -> TaskId {
    TaskId::parse(raw).expect("task id")
}

fn open_service(state_root: &std::path::Path) -> DependencyService {
    DependencyService::new(
        Arc::new(FileGraphStore::new(state_root)),
        Arc::new(OpenTaskDirectory),
    )
}

#[test]
fn blocks_chain_rejects_closing_edge_with_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = open_service(dir.path());
    service.link("A", "B", "BLOCKS", None).expect("A blocks B");
    service.link("B", "C", "blocks", None).expect("B blocks C");

    let err = service.link("C", "A", "BLOCKS", None).expect_err("cycle");
    assert_eq!(err.kind(), ErrorKind::CycleDetected);
    match err {
        EngineError::CycleDetected { path, .. } => {
            assert_eq!(path, vec!["A".to_string(), "B".to_string(), "C".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.graph().expect("graph").len(), 2);
}

#[test]
fn non_blocking_relations_may_form_cycles() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = open_service(dir.path());
    service.link("A", "B", "BLOCKS", None).expect("blocks");
    service.link("B", "A", "RELATES", None).expect("relates");
    service.link("C", "A", "DUPLICATES", None).expect("duplicates");

    let err = service
        .link("A", "B", "RELATES", None)
        .expect_err("symmetric duplicate");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let relationships = service.relationships("A").expect("relationships");
    assert_eq!(relationships.blocks, vec!["B".to_string()]);
    assert!(relationships.blocked_by.is_empty());
    assert_eq!(relationships.relates, vec!["B".to_string()]);
    assert_eq!(relationships.duplicates, vec!["C".to_string()]);
}

#[test]
fn self_links_and_bad_relation_types_are_validation_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = open_service(dir.path());
    assert_eq!(
        service.link("A", "A", "RELATES", None).expect_err("self").kind(),
        ErrorKind::Validation
    );
    assert_eq!(
        service.link("A", "B", "PARENT", None).expect_err("type").kind(),
        ErrorKind::Validation
    );
    assert!(service.graph().expect("graph").is_empty());
}

#[test]
fn unlink_then_relink_restores_the_same_relationships() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = open_service(dir.path());
    let mut metadata = serde_json::Map::new();
    metadata.insert("author".to_string(), serde_json::json!("sam"));
    let metadata = Metadata::from_map(metadata).expect("metadata");
    service
        .link("A", "B", "BLOCKS", Some(metadata))
        .expect("link");
    service.link("B", "C", "BLOCKS", None).expect("link");
    let before = service.relationships("B").expect("before");

    match service.unlink("B", "A", None).expect("unlink") {
        UnlinkOutcome::Removed { edge } => {
            assert_eq!(edge.from_task, task("A"));
            assert_eq!(edge.metadata.author(), Some("sam"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(service.relationships("B").expect("after").blocked_by.is_empty());

    service.link("A", "B", "BLOCKS", None).expect("relink");
    assert_eq!(service.relationships("B").expect("relinked"), before);
}

#[test]
fn unlink_without_relationship_is_not_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = open_service(dir.path());
    service.link("A", "B", "RELATES", None).expect("link");
    let outcome = service
        .unlink("A", "B", Some("BLOCKS"))
        .expect("unlink");
    assert!(matches!(outcome, UnlinkOutcome::NoRelationship { .. }));
    assert_eq!(service.graph().expect("graph").len(), 1);
}

#[test]
fn unknown_tasks_are_rejected_by_the_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = DependencyService::new(
        Arc::new(FileGraphStore::new(dir.path())),
        Arc::new(StaticTaskDirectory::new([task("A"), task("B")])),
    );
    service.link("A", "B", "BLOCKS", None).expect("known tasks");
    let err = service.link("A", "Z", "BLOCKS", None).expect_err("missing");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("`Z`"));
}

#[test]
fn tracked_directory_follows_recorded_task_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let states = Arc::new(FileStateStore::new(dir.path()));
    let directory = TrackedTaskDirectory::new(states.clone());
    assert!(!directory.exists(&task("AL-1")).expect("lookup"));

    let state = workstate::engine::WorkflowState::new(task("AL-1"), chrono::Utc::now());
    workstate::store::StateStore::save(states.as_ref(), &state).expect("save");
    assert!(directory.exists(&task("AL-1")).expect("lookup"));
}

#[test]
fn graph_persists_across_service_instances() {
    let dir = tempfile::tempdir().expect("tempdir");
    open_service(dir.path())
        .link("A", "B", "BLOCKS", None)
        .expect("link");
    let reopened = open_service(dir.path());
    let err = reopened.link("B", "A", "BLOCKS", None).expect_err("cycle");
    assert_eq!(err.kind(), ErrorKind::CycleDetected);
}

#[test]
fn sqlite_graph_store_backs_the_service() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(SqliteGraphStore::open(dir.path()).expect("open"));
    let service = DependencyService::new(store.clone(), Arc::new(OpenTaskDirectory));
    service.link("A", "B", "BLOCKS", None).expect("link");
    service.link("C", "B", "RELATES", None).expect("link");

    let graph = store.load().expect("load");
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.blocked_by("B").len(), 1);
}
