//! Read-only registry of workflow definitions and subagent profiles.
//!
//! Built once at process start and shared by reference. Workflow definitions
//! are required: when they cannot be loaded the catalog is recorded as
//! unavailable and every lookup fails with a configuration error. Subagent
//! profiles are advisory: problems degrade to an empty registry plus a
//! warning.

use crate::config::{
    load_subagents, load_workflow_definitions, validate_workflow_set, ConfigError, Phase,
    Subagent, SubagentId, WorkflowDefinition, WorkflowId,
};
use crate::shared::errors::EngineError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    /// Advisory data was dropped; operations continue.
    Degraded,
    /// Required data is missing; definition-dependent operations fail.
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionWarning {
    pub severity: WarningSeverity,
    pub source: String,
    pub message: String,
}

impl std::fmt::Display for DefinitionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

#[derive(Debug)]
pub struct DefinitionLoad {
    pub store: DefinitionStore,
    pub warnings: Vec<DefinitionWarning>,
}

#[derive(Debug, Clone)]
enum WorkflowCatalog {
    Loaded(BTreeMap<WorkflowId, WorkflowDefinition>),
    Unavailable { reason: String },
}

#[derive(Debug, Clone)]
pub struct DefinitionStore {
    workflows: WorkflowCatalog,
    subagents: BTreeMap<SubagentId, Subagent>,
}

impl DefinitionStore {
    /// Builds a store from already-parsed definitions, validating the set.
    pub fn from_parts(
        workflows: Vec<WorkflowDefinition>,
        subagents: Vec<Subagent>,
    ) -> Result<Self, ConfigError> {
        validate_workflow_set(&workflows)?;
        Ok(Self {
            workflows: WorkflowCatalog::Loaded(
                workflows
                    .into_iter()
                    .map(|definition| (definition.id.clone(), definition))
                    .collect(),
            ),
            subagents: index_subagents(subagents),
        })
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            workflows: WorkflowCatalog::Unavailable {
                reason: reason.into(),
            },
            subagents: BTreeMap::new(),
        }
    }

    /// Loads definitions from disk. Never fails: problems are reported as
    /// warnings and logged.
    pub fn load(workflows_path: &Path, subagents_path: Option<&Path>) -> DefinitionLoad {
        let mut warnings = Vec::new();

        let workflows = match load_workflow_definitions(workflows_path) {
            Ok(definitions) => {
                tracing::debug!(
                    path = %workflows_path.display(),
                    count = definitions.len(),
                    "loaded workflow definitions"
                );
                WorkflowCatalog::Loaded(
                    definitions
                        .into_iter()
                        .map(|definition| (definition.id.clone(), definition))
                        .collect(),
                )
            }
            Err(err) => {
                let reason = err.to_string();
                tracing::error!(
                    path = %workflows_path.display(),
                    error = %reason,
                    "workflow definitions unavailable"
                );
                warnings.push(DefinitionWarning {
                    severity: WarningSeverity::Fatal,
                    source: workflows_path.display().to_string(),
                    message: reason.clone(),
                });
                WorkflowCatalog::Unavailable { reason }
            }
        };

        let subagents = match subagents_path {
            None => BTreeMap::new(),
            Some(path) if !path.exists() => {
                warnings.push(degraded(path, "subagent registry not found; continuing without profiles"));
                BTreeMap::new()
            }
            Some(path) => match load_subagents(path) {
                Ok(subagents) => index_subagents(subagents),
                Err(err) => {
                    warnings.push(degraded(
                        path,
                        &format!("{err}; continuing without profiles"),
                    ));
                    BTreeMap::new()
                }
            },
        };

        for warning in &warnings {
            if warning.severity == WarningSeverity::Degraded {
                tracing::warn!(source = %warning.source, "{}", warning.message);
            }
        }

        DefinitionLoad {
            store: Self {
                workflows,
                subagents,
            },
            warnings,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.workflows, WorkflowCatalog::Loaded(_))
    }

    pub fn list_workflows(&self) -> Result<&BTreeMap<WorkflowId, WorkflowDefinition>, EngineError> {
        match &self.workflows {
            WorkflowCatalog::Loaded(workflows) => Ok(workflows),
            WorkflowCatalog::Unavailable { reason } => Err(EngineError::DefinitionsUnavailable {
                reason: reason.clone(),
            }),
        }
    }

    pub fn get_workflow(&self, workflow_id: &str) -> Result<&WorkflowDefinition, EngineError> {
        self.list_workflows()?
            .get(workflow_id)
            .ok_or_else(|| EngineError::UnknownWorkflow {
                workflow_id: workflow_id.to_string(),
            })
    }

    /// Definitions that declare a phase called `phase`, in id order.
    pub fn workflows_with_phase(&self, phase: &str) -> Result<Vec<&WorkflowDefinition>, EngineError> {
        Ok(self
            .list_workflows()?
            .values()
            .filter(|definition| definition.phase(phase).is_some())
            .collect())
    }

    /// Resolves the given ids, silently skipping ids with no profile.
    pub fn get_subagents<I, S>(&self, ids: I) -> Vec<&Subagent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .filter_map(|id| self.subagents.get(id.as_ref()))
            .collect()
    }

    pub fn list_subagents(&self) -> impl Iterator<Item = &Subagent> {
        self.subagents.values()
    }

    pub fn subagent_for_phase(&self, phase: &Phase) -> Option<&Subagent> {
        phase
            .persona
            .as_deref()
            .and_then(|persona| self.subagents.get(persona))
    }
}

fn index_subagents(subagents: Vec<Subagent>) -> BTreeMap<SubagentId, Subagent> {
    subagents
        .into_iter()
        .map(|subagent| (subagent.id.clone(), subagent))
        .collect()
}

fn degraded(path: &Path, message: &str) -> DefinitionWarning {
    DefinitionWarning {
        severity: WarningSeverity::Degraded,
        source: path.display().to_string(),
        message: message.to_string(),
    }
}
