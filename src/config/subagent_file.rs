use super::{ConfigError, SubagentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Advisory profile describing the persona and tooling a phase suggests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Subagent {
    pub id: SubagentId,
    #[serde(default)]
    pub claude_subagent: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub when_to_use: String,
    #[serde(default)]
    pub example_prompts: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct SubagentEntry {
    #[serde(default)]
    claude_subagent: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    when_to_use: String,
    #[serde(default)]
    example_prompts: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SubagentDocument {
    #[serde(default)]
    subagents: BTreeMap<SubagentId, SubagentEntry>,
}

pub fn parse_subagent_document(raw: &str, path: &Path) -> Result<Vec<Subagent>, ConfigError> {
    let document: SubagentDocument =
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    Ok(document
        .subagents
        .into_iter()
        .map(|(id, entry)| Subagent {
            claude_subagent: if entry.claude_subagent.trim().is_empty() {
                id.to_string()
            } else {
                entry.claude_subagent
            },
            id,
            description: entry.description,
            when_to_use: entry.when_to_use,
            example_prompts: entry.example_prompts,
        })
        .collect())
}

pub fn load_subagents(path: &Path) -> Result<Vec<Subagent>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_subagent_document(&raw, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_default_claude_subagent_to_their_id() {
        let subagents = parse_subagent_document(
            r#"
subagents:
  code-reviewer:
    description: Reviews diffs
    example_prompts: ["review the auth change"]
  planner:
    claude_subagent: architect
"#,
            Path::new("subagents.yaml"),
        )
        .expect("parse");
        assert_eq!(subagents.len(), 2);
        assert_eq!(subagents[0].id.as_str(), "code-reviewer");
        assert_eq!(subagents[0].claude_subagent, "code-reviewer");
        assert_eq!(subagents[1].claude_subagent, "architect");
    }

    #[test]
    fn invalid_ids_fail_to_parse() {
        let err = parse_subagent_document(
            "subagents:\n  \"bad id\": {}\n",
            Path::new("subagents.yaml"),
        )
        .expect_err("invalid id");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
