use super::{ConfigError, WorkflowId};
use crate::shared::serde_ext::is_false;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Phase {
    pub name: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub requires_review: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkflowDefinition {
    pub id: WorkflowId,
    pub name: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub creates_task: bool,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

impl WorkflowDefinition {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Workflow(format!(
                "workflow `{}` requires non-empty `name`",
                self.id
            )));
        }
        if self.phases.is_empty() {
            return Err(ConfigError::Workflow(format!(
                "workflow `{}` must declare at least one phase",
                self.id
            )));
        }
        let mut seen = HashSet::new();
        for phase in &self.phases {
            if phase.name.trim().is_empty() {
                return Err(ConfigError::Workflow(format!(
                    "workflow `{}` declares a phase with an empty name",
                    self.id
                )));
            }
            if phase.name.trim() != phase.name {
                return Err(ConfigError::Workflow(format!(
                    "workflow `{}` phase `{}` has leading or trailing whitespace",
                    self.id, phase.name
                )));
            }
            if !seen.insert(phase.name.as_str()) {
                return Err(ConfigError::Workflow(format!(
                    "workflow `{}` declares phase `{}` more than once",
                    self.id, phase.name
                )));
            }
        }
        Ok(())
    }

    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|phase| phase.name == name)
    }

    pub fn phase_names(&self) -> impl Iterator<Item = &str> {
        self.phases.iter().map(|phase| phase.name.as_str())
    }
}

/// A workflows document is either a `workflows:` list or one bare definition.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkflowDocument {
    Many { workflows: Vec<WorkflowDefinition> },
    Single(WorkflowDefinition),
}

impl WorkflowDocument {
    fn into_definitions(self) -> Vec<WorkflowDefinition> {
        match self {
            Self::Many { workflows } => workflows,
            Self::Single(definition) => vec![definition],
        }
    }
}

pub fn parse_workflow_document(raw: &str, path: &Path) -> Result<Vec<WorkflowDefinition>, ConfigError> {
    let document: WorkflowDocument =
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    Ok(document.into_definitions())
}

/// Reads definitions from one YAML file or from every `*.yaml`/`*.yml` file
/// of a directory, in file-name order. Each definition is validated and
/// workflow ids must be unique across the whole set.
pub fn load_workflow_definitions(path: &Path) -> Result<Vec<WorkflowDefinition>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingWorkflows {
            path: path.display().to_string(),
        });
    }
    let files = if path.is_dir() {
        yaml_files_in(path)?
    } else {
        vec![path.to_path_buf()]
    };
    if files.is_empty() {
        return Err(ConfigError::MissingWorkflows {
            path: path.display().to_string(),
        });
    }

    let mut definitions = Vec::new();
    for file in files {
        let raw = fs::read_to_string(&file).map_err(|source| ConfigError::Read {
            path: file.display().to_string(),
            source,
        })?;
        definitions.extend(parse_workflow_document(&raw, &file)?);
    }
    validate_workflow_set(&definitions)?;
    Ok(definitions)
}

pub fn validate_workflow_set(definitions: &[WorkflowDefinition]) -> Result<(), ConfigError> {
    if definitions.is_empty() {
        return Err(ConfigError::Workflow(
            "at least one workflow must be defined".to_string(),
        ));
    }
    let mut ids = HashSet::new();
    for definition in definitions {
        definition.validate()?;
        if !ids.insert(definition.id.as_str()) {
            return Err(ConfigError::Workflow(format!(
                "duplicate workflow id `{}`",
                definition.id
            )));
        }
    }
    Ok(())
}

fn yaml_files_in(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = fs::read_dir(dir).map_err(|source| ConfigError::Read {
        path: dir.display().to_string(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Read {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        if path.is_file() && is_yaml {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
