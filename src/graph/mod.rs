pub mod dependency_graph;
pub mod edge;
pub mod service;
pub mod task_directory;

pub use dependency_graph::{DependencyGraph, TaskRelationships};
pub use edge::{DependencyEdge, RelationType};
pub use service::{DependencyService, UnlinkOutcome};
pub use task_directory::{
    OpenTaskDirectory, StaticTaskDirectory, TaskDirectory, TrackedTaskDirectory,
};
