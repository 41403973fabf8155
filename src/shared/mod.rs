pub mod clock;
pub mod errors;
pub mod fs_atomic;
pub mod ids;
pub mod keyed_lock;
pub mod metadata;
pub mod serde_ext;

pub use clock::{system_clock, Clock};
pub use errors::{EngineError, ErrorKind};
pub use ids::{SubagentId, TaskId, WorkflowId};
pub use keyed_lock::KeyedLocks;
pub use metadata::Metadata;
