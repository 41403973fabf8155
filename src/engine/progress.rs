use super::phase_state::PhaseState;
use super::state::WorkflowState;
use crate::config::{Phase, Subagent, WorkflowDefinition};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseProgress {
    pub name: String,
    pub state: PhaseState,
    pub requires_review: bool,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub task_id: String,
    pub workflow_id: String,
    pub completed: usize,
    pub total: usize,
    pub ratio: f64,
    pub workflow_complete: bool,
    pub phases: Vec<PhaseProgress>,
}

impl ProgressReport {
    pub fn build(state: &WorkflowState, definition: &WorkflowDefinition) -> Self {
        let phases = definition
            .phases
            .iter()
            .map(|phase| PhaseProgress {
                name: phase.name.clone(),
                state: state.phase_state(&phase.name),
                requires_review: phase.requires_review,
                entries: state.entry_count(&phase.name),
            })
            .collect::<Vec<_>>();
        let completed = phases
            .iter()
            .filter(|phase| phase.state == PhaseState::Completed)
            .count();
        let total = phases.len();
        let ratio = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64
        };
        Self {
            task_id: state.task_id.to_string(),
            workflow_id: definition.id.to_string(),
            completed,
            total,
            ratio,
            workflow_complete: total > 0 && completed == total,
            phases,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingPhase {
    pub workflow_id: String,
    pub phase: Phase,
    /// Zero-based position in the definition.
    pub index: usize,
    pub total: usize,
    pub state: PhaseState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subagent: Option<Subagent>,
}

/// What a task should work on next.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextPhase {
    AssignmentRequired { task_id: String },
    Pending(PendingPhase),
    WorkflowComplete { workflow_id: String },
}

impl NextPhase {
    /// First phase in definition order that is not completed.
    pub fn resolve(
        state: &WorkflowState,
        definition: &WorkflowDefinition,
        subagent: impl Fn(&Phase) -> Option<Subagent>,
    ) -> Self {
        let total = definition.phases.len();
        definition
            .phases
            .iter()
            .enumerate()
            .map(|(index, phase)| (index, phase, state.phase_state(&phase.name)))
            .find(|(_, _, phase_state)| *phase_state != PhaseState::Completed)
            .map(|(index, phase, phase_state)| {
                Self::Pending(PendingPhase {
                    workflow_id: definition.id.to_string(),
                    phase: phase.clone(),
                    index,
                    total,
                    state: phase_state,
                    subagent: subagent(phase),
                })
            })
            .unwrap_or_else(|| Self::WorkflowComplete {
                workflow_id: definition.id.to_string(),
            })
    }
}
