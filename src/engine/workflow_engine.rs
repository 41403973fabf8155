use super::phase_state::{after_save, PhaseState, SaveStatus};
use super::progress::{NextPhase, ProgressReport};
use super::state::{ContextEntry, PhaseEntry, WorkflowState};
use crate::config::{Subagent, WorkflowDefinition};
use crate::definitions::DefinitionStore;
use crate::shared::clock::{system_clock, Clock};
use crate::shared::errors::EngineError;
use crate::shared::ids::{TaskId, WorkflowId};
use crate::shared::keyed_lock::KeyedLocks;
use crate::shared::metadata::Metadata;
use crate::store::StateStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignOutcome {
    pub state: WorkflowState,
    /// False when the task already ran the requested workflow.
    pub newly_assigned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseTransition {
    pub from: PhaseState,
    pub to: PhaseState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveOutcome {
    pub state: WorkflowState,
    pub phase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<PhaseTransition>,
    /// Set when this save attached a workflow to a previously unassigned task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inferred_workflow: Option<WorkflowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SaveOutcome {
    pub fn phase_state(&self) -> PhaseState {
        self.state.phase_state(&self.phase)
    }
}

/// Phase state machine over durable per-task records.
///
/// Every mutating call is a read-modify-write of one `WorkflowState` under a
/// per-task lock. Input validation happens before the lock is taken; the
/// record is written only after every check passed.
pub struct WorkflowEngine {
    definitions: Arc<DefinitionStore>,
    states: Arc<dyn StateStore>,
    locks: KeyedLocks,
    clock: Clock,
    default_workflow: Option<WorkflowId>,
}

impl WorkflowEngine {
    pub fn new(definitions: Arc<DefinitionStore>, states: Arc<dyn StateStore>) -> Self {
        Self {
            definitions,
            states,
            locks: KeyedLocks::new(),
            clock: system_clock(),
            default_workflow: None,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Workflow preferred when a save on an unassigned task has to infer one.
    pub fn with_default_workflow(mut self, workflow_id: Option<WorkflowId>) -> Self {
        self.default_workflow = workflow_id;
        self
    }

    pub fn definitions(&self) -> &DefinitionStore {
        &self.definitions
    }

    pub fn list_workflows(&self) -> Result<&BTreeMap<WorkflowId, WorkflowDefinition>, EngineError> {
        self.definitions.list_workflows()
    }

    pub fn get_workflow(&self, workflow_id: &str) -> Result<&WorkflowDefinition, EngineError> {
        self.definitions.get_workflow(workflow_id)
    }

    pub fn get_subagents<I, S>(&self, ids: I) -> Vec<&Subagent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.definitions.get_subagents(ids)
    }

    pub fn assign_workflow(
        &self,
        task_id: &str,
        workflow_id: &str,
    ) -> Result<AssignOutcome, EngineError> {
        let task_id = parse_task_id(task_id)?;
        let definition = self.definitions.get_workflow(workflow_id)?;

        self.locks.with_lock(task_id.as_str(), || -> Result<AssignOutcome, EngineError> {
            let now = (self.clock)();
            let mut state = self
                .states
                .load(&task_id)?
                .unwrap_or_else(|| WorkflowState::new(task_id.clone(), now));
            if let Some(current) = state.workflow_id.clone() {
                if current != definition.id {
                    return Err(EngineError::WorkflowAlreadyAssigned {
                        task_id: task_id.to_string(),
                        assigned: current.to_string(),
                        requested: definition.id.to_string(),
                    });
                }
                return Ok(AssignOutcome {
                    state,
                    newly_assigned: false,
                });
            }
            ensure_phases_declared(&state, definition)?;
            state.workflow_id = Some(definition.id.clone());
            state.touch(now);
            self.states.save(&state)?;
            tracing::info!(
                task_id = %task_id,
                workflow_id = %definition.id,
                "assigned workflow"
            );
            Ok(AssignOutcome {
                state,
                newly_assigned: true,
            })
        })
    }

    /// Switches a task to another workflow. Phase progress starts over;
    /// recorded context and artifacts stay.
    pub fn reassign_workflow(
        &self,
        task_id: &str,
        workflow_id: &str,
    ) -> Result<WorkflowState, EngineError> {
        let task_id = parse_task_id(task_id)?;
        let definition = self.definitions.get_workflow(workflow_id)?;

        self.locks.with_lock(task_id.as_str(), || -> Result<WorkflowState, EngineError> {
            let now = (self.clock)();
            let mut state = self
                .states
                .load(&task_id)?
                .unwrap_or_else(|| WorkflowState::new(task_id.clone(), now));
            let previous = state.workflow_id.replace(definition.id.clone());
            state.reset_progress();
            state.touch(now);
            self.states.save(&state)?;
            tracing::info!(
                task_id = %task_id,
                workflow_id = %definition.id,
                previous = previous.as_ref().map(|id| id.as_str()).unwrap_or("none"),
                "reassigned workflow"
            );
            Ok(state)
        })
    }

    pub fn get_next_phase(&self, task_id: &str) -> Result<NextPhase, EngineError> {
        let task_id = parse_task_id(task_id)?;
        let Some(state) = self.states.load(&task_id)? else {
            return Ok(NextPhase::AssignmentRequired {
                task_id: task_id.to_string(),
            });
        };
        let Some(workflow_id) = &state.workflow_id else {
            return Ok(NextPhase::AssignmentRequired {
                task_id: task_id.to_string(),
            });
        };
        let definition = self.definitions.get_workflow(workflow_id.as_str())?;
        Ok(NextPhase::resolve(&state, definition, |phase| {
            self.definitions.subagent_for_phase(phase).cloned()
        }))
    }

    /// Appends a context entry with metadata given as encoded JSON text.
    pub fn save_context(
        &self,
        task_id: &str,
        phase: &str,
        content: &str,
        status: Option<&str>,
        metadata: Option<&str>,
    ) -> Result<SaveOutcome, EngineError> {
        let metadata = match metadata {
            Some(raw) => Metadata::parse(raw)?,
            None => Metadata::default(),
        };
        self.save_context_with_metadata(task_id, phase, content, status, metadata)
    }

    pub fn save_context_with_metadata(
        &self,
        task_id: &str,
        phase: &str,
        content: &str,
        status: Option<&str>,
        metadata: Metadata,
    ) -> Result<SaveOutcome, EngineError> {
        let task_id = parse_task_id(task_id)?;
        let phase = phase.trim();
        if content.trim().is_empty() {
            return Err(EngineError::EmptyContent {
                task_id: task_id.to_string(),
                phase: phase.to_string(),
            });
        }
        let status = SaveStatus::parse(status);

        self.locks.with_lock(task_id.as_str(), || -> Result<SaveOutcome, EngineError> {
            let now = (self.clock)();
            let mut state = self
                .states
                .load(&task_id)?
                .unwrap_or_else(|| WorkflowState::new(task_id.clone(), now));

            let (definition, inferred_workflow) = match &state.workflow_id {
                Some(workflow_id) => {
                    let definition = self.definitions.get_workflow(workflow_id.as_str())?;
                    if definition.phase(phase).is_none() {
                        return Err(EngineError::UnknownPhase {
                            workflow_id: workflow_id.to_string(),
                            phase: phase.to_string(),
                        });
                    }
                    (Some(definition), None)
                }
                None => {
                    let inferred = self.infer_workflow(phase)?;
                    let id = inferred.map(|definition| definition.id.clone());
                    (inferred, id)
                }
            };

            let sequence = state.next_sequence();
            state.append_entry(
                phase,
                ContextEntry {
                    sequence,
                    content: content.to_string(),
                    timestamp: now,
                    status: Some(status.as_str().to_string()),
                    metadata: metadata.clone(),
                },
            );
            state.merge_artifacts(metadata.artifacts());

            let mut transition = None;
            let mut note = None;
            match definition {
                Some(definition) => {
                    if let Some(id) = &inferred_workflow {
                        state.workflow_id = Some(id.clone());
                    }
                    let requires_review = definition
                        .phase(phase)
                        .is_some_and(|declared| declared.requires_review);
                    let current = state.phase_state(phase);
                    let effect = after_save(current, &status, requires_review);
                    state.set_phase_state(phase, effect.next);
                    if effect.next != current {
                        transition = Some(PhaseTransition {
                            from: current,
                            to: effect.next,
                        });
                    }
                    if effect.review_gate_held {
                        note = Some(format!(
                            "phase `{phase}` requires review; save with status REVIEW before completing"
                        ));
                    } else if current == PhaseState::Completed {
                        note = Some(format!(
                            "phase `{phase}` is already completed; entry recorded"
                        ));
                    }
                }
                None => {
                    note = Some(format!(
                        "no single workflow declares phase `{phase}`; entry recorded without a phase transition"
                    ));
                }
            }

            state.touch(now);
            self.states.save(&state)?;
            tracing::info!(
                task_id = %task_id,
                phase = phase,
                status = status.as_str(),
                transition = ?transition,
                "saved context"
            );
            if let Some(id) = &inferred_workflow {
                tracing::info!(task_id = %task_id, workflow_id = %id, "inferred workflow");
            }
            Ok(SaveOutcome {
                state,
                phase: phase.to_string(),
                transition,
                inferred_workflow,
                note,
            })
        })
    }

    /// Entries in recorded order, optionally limited to one phase.
    pub fn load_context(
        &self,
        task_id: &str,
        phase: Option<&str>,
    ) -> Result<Vec<PhaseEntry>, EngineError> {
        Ok(self.get_state(task_id)?.entries(phase.map(str::trim)))
    }

    pub fn get_progress(&self, task_id: &str) -> Result<ProgressReport, EngineError> {
        let state = self.get_state(task_id)?;
        let Some(workflow_id) = &state.workflow_id else {
            return Err(EngineError::WorkflowNotAssigned {
                task_id: state.task_id.to_string(),
            });
        };
        let definition = self.definitions.get_workflow(workflow_id.as_str())?;
        Ok(ProgressReport::build(&state, definition))
    }

    pub fn get_state(&self, task_id: &str) -> Result<WorkflowState, EngineError> {
        let task_id = parse_task_id(task_id)?;
        self.states
            .load(&task_id)?
            .ok_or_else(|| EngineError::UnknownTask {
                task_id: task_id.to_string(),
            })
    }

    pub fn list_tasks(&self) -> Result<Vec<TaskId>, EngineError> {
        self.states.task_ids()
    }

    /// Default workflow when it declares the phase, else the only workflow
    /// that does. `None` when several declare it.
    fn infer_workflow(&self, phase: &str) -> Result<Option<&WorkflowDefinition>, EngineError> {
        let candidates = self.definitions.workflows_with_phase(phase)?;
        if candidates.is_empty() {
            return Err(EngineError::UndeclaredPhase {
                phase: phase.to_string(),
            });
        }
        if let Some(default) = &self.default_workflow {
            if let Some(definition) = candidates.iter().find(|d| &d.id == default) {
                return Ok(Some(*definition));
            }
        }
        match candidates.as_slice() {
            [only] => Ok(Some(*only)),
            _ => Ok(None),
        }
    }
}

/// Phase sets on an unassigned record are empty unless written by hand; a
/// record carrying phases the new definition lacks is rejected.
fn ensure_phases_declared(
    state: &WorkflowState,
    definition: &WorkflowDefinition,
) -> Result<(), EngineError> {
    match state
        .started_phases
        .iter()
        .find(|phase| definition.phase(phase).is_none())
    {
        Some(phase) => Err(EngineError::UnknownPhase {
            workflow_id: definition.id.to_string(),
            phase: phase.to_string(),
        }),
        None => Ok(()),
    }
}

fn parse_task_id(raw: &str) -> Result<TaskId, EngineError> {
    let raw = raw.trim();
    TaskId::parse(raw).map_err(|reason| EngineError::invalid_id(TaskId::KIND, raw, reason))
}
