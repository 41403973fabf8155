pub mod phase_state;
pub mod progress;
pub mod state;
pub mod workflow_engine;

pub use phase_state::{PhaseState, SaveStatus};
pub use progress::{NextPhase, PendingPhase, PhaseProgress, ProgressReport};
pub use state::{ContextEntry, PhaseEntry, PhaseSet, WorkflowState};
pub use workflow_engine::{AssignOutcome, PhaseTransition, SaveOutcome, WorkflowEngine};
