use chrono::{TimeZone, Utc};
use std::fs;
use std::sync::Arc;
use workstate::engine::{ContextEntry, PhaseState, WorkflowState};
use workstate::graph::{
    DependencyEdge, DependencyGraph, DependencyService, OpenTaskDirectory, RelationType,
};
use workstate::shared::{ErrorKind, Metadata, TaskId, WorkflowId};
use workstate::store::{
    FileGraphStore, FileStateStore, GraphStore, SqliteGraphStore, SqliteStateStore, StateStore,
    DATABASE_FILE_NAME,
};

fn task(raw: &str) -> TaskId {
    TaskId::parse(raw).expect("task id")
}

fn sample_state(raw: &str) -> WorkflowState {
    let at = Utc
        .with_ymd_and_hms(2026, 3, 4, 10, 0, 0)
        .single()
        .expect("timestamp");
    let mut state = WorkflowState::new(task(raw), at);
    state.workflow_id = Some(WorkflowId::parse("task").expect("workflow id"));
    state.set_phase_state("planning", PhaseState::Completed);
    state.set_phase_state("implement", PhaseState::ReviewRequired);
    let metadata =
        Metadata::parse(r##"{"tags":["api"],"artifacts":{"pr":"#12"}}"##).expect("metadata");
    let sequence = state.next_sequence();
    state.append_entry(
        "implement",
        ContextEntry {
            sequence,
            content: "opened PR".to_string(),
            timestamp: at,
            status: Some("REVIEW".to_string()),
            metadata: metadata.clone(),
        },
    );
    state.merge_artifacts(metadata.artifacts());
    state
}

fn sample_graph() -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    graph
        .link(DependencyEdge::new(task("A"), task("B"), RelationType::Blocks))
        .expect("blocks");
    graph
        .link(DependencyEdge::new(task("C"), task("A"), RelationType::Duplicates))
        .expect("duplicates");
    graph
}

fn assert_state_round_trip(store: &dyn StateStore) {
    assert!(store.load(&task("AL-1")).expect("load").is_none());
    assert!(!store.contains(&task("AL-1")).expect("contains"));

    let state = sample_state("AL-1");
    store.save(&state).expect("save");
    store.save(&sample_state("AL-0")).expect("save");
    let loaded = store.load(&task("AL-1")).expect("load").expect("present");
    assert_eq!(loaded, state);
    assert_eq!(loaded.phase_state("implement"), PhaseState::ReviewRequired);
    assert_eq!(store.task_ids().expect("ids"), vec![task("AL-0"), task("AL-1")]);
}

#[test]
fn json_state_store_round_trips_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert_state_round_trip(&FileStateStore::new(dir.path()));
}

#[test]
fn sqlite_state_store_round_trips_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SqliteStateStore::open(dir.path()).expect("open");
    assert_eq!(
        store.database_path(),
        dir.path().join(DATABASE_FILE_NAME).as_path()
    );
    assert_state_round_trip(&store);
}

#[test]
fn json_store_rejects_record_written_for_another_task() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(dir.path());
    store.save(&sample_state("AL-1")).expect("save");
    fs::copy(
        store.record_path(&task("AL-1")),
        store.record_path(&task("AL-2")),
    )
    .expect("copy");
    let err = store.load(&task("AL-2")).expect_err("corrupt");
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[test]
fn json_store_task_ids_skip_temp_and_foreign_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(dir.path());
    store.save(&sample_state("AL-1")).expect("save");
    let tasks_dir = dir.path().join("tasks");
    fs::write(tasks_dir.join(".AL-2.json.tmp-1-1"), "{}").expect("temp");
    fs::write(tasks_dir.join("notes.txt"), "x").expect("notes");
    assert_eq!(store.task_ids().expect("ids"), vec![task("AL-1")]);
}

#[test]
fn graph_stores_round_trip_edges_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sqlite = SqliteGraphStore::open(dir.path()).expect("open");
    let json = FileGraphStore::new(dir.path());
    let stores: [&dyn GraphStore; 2] = [&json, &sqlite];
    for store in stores {
        assert!(store.load().expect("empty").is_empty());
        let graph = sample_graph();
        store.save(&graph).expect("save");
        let loaded = store.load().expect("load");
        assert_eq!(loaded.edges(), graph.edges());
        assert_eq!(loaded.blocks("A").len(), 1);

        let mut shrunk = loaded.clone();
        shrunk.unlink("A", "B", None).expect("edge");
        store.save(&shrunk).expect("save");
        assert_eq!(store.load().expect("load").len(), 1);
    }
}

const CYCLIC_GRAPH_JSON: &str = r#"{"edges":[
    {"from_task":"A","to_task":"B","relation_type":"BLOCKS"},
    {"from_task":"B","to_task":"A","relation_type":"BLOCKS"}
]}"#;

#[test]
fn json_graph_with_cyclic_edges_is_corrupt_and_left_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileGraphStore::new(dir.path()));
    fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
    fs::write(store.path(), CYCLIC_GRAPH_JSON).expect("write");

    let err = store.load().expect_err("corrupt graph");
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(err.to_string().contains("stored dependency edge rejected"));

    let service = DependencyService::new(store.clone(), Arc::new(OpenTaskDirectory));
    let err = service
        .link("C", "D", "RELATES", None)
        .expect_err("link on corrupt graph");
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(
        fs::read_to_string(store.path()).expect("read"),
        CYCLIC_GRAPH_JSON
    );
}

#[test]
fn sqlite_graph_with_duplicate_rows_is_corrupt() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SqliteGraphStore::open(dir.path()).expect("open");
    let connection =
        rusqlite::Connection::open(dir.path().join(DATABASE_FILE_NAME)).expect("connect");
    connection
        .execute_batch(
            "INSERT INTO dependency_edges (position, from_task, to_task, relation_type)
             VALUES (0, 'A', 'B', 'BLOCKS'), (1, 'A', 'B', 'BLOCKS');",
        )
        .expect("seed rows");

    let err = store.load().expect_err("corrupt graph");
    assert_eq!(err.kind(), ErrorKind::Storage);
}
