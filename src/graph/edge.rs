use crate::shared::errors::EngineError;
use crate::shared::ids::TaskId;
use crate::shared::metadata::Metadata;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    Blocks,
    Relates,
    Duplicates,
}

impl RelationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "BLOCKS",
            Self::Relates => "RELATES",
            Self::Duplicates => "DUPLICATES",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BLOCKS" => Ok(Self::Blocks),
            "RELATES" => Ok(Self::Relates),
            "DUPLICATES" => Ok(Self::Duplicates),
            _ => Err(EngineError::InvalidRelationType(raw.to_string())),
        }
    }

    /// Only `BLOCKS` has a direction; the others read the same both ways.
    pub fn is_directional(self) -> bool {
        matches!(self, Self::Blocks)
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from_task: TaskId,
    pub to_task: TaskId,
    pub relation_type: RelationType,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl DependencyEdge {
    pub fn new(from_task: TaskId, to_task: TaskId, relation_type: RelationType) -> Self {
        Self {
            from_task,
            to_task,
            relation_type,
            metadata: Metadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Same relationship, honoring direction only for directional types.
    pub fn connects(&self, a: &str, b: &str, relation_type: RelationType) -> bool {
        if self.relation_type != relation_type {
            return false;
        }
        let forward = self.from_task.as_str() == a && self.to_task.as_str() == b;
        let backward = self.from_task.as_str() == b && self.to_task.as_str() == a;
        forward || (!relation_type.is_directional() && backward)
    }

    /// Either direction, regardless of type.
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.from_task.as_str() == a && self.to_task.as_str() == b)
            || (self.from_task.as_str() == b && self.to_task.as_str() == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> TaskId {
        TaskId::parse(raw).expect("task id")
    }

    #[test]
    fn relation_type_parses_case_insensitively() {
        assert_eq!(RelationType::parse("blocks").expect("parse"), RelationType::Blocks);
        assert_eq!(
            RelationType::parse(" Duplicates ").expect("parse"),
            RelationType::Duplicates
        );
        let err = RelationType::parse("parent").expect_err("unknown type");
        assert!(err.to_string().contains("invalid relation type `parent`"));
    }

    #[test]
    fn symmetric_relations_match_in_both_directions() {
        let relates = DependencyEdge::new(id("A"), id("B"), RelationType::Relates);
        assert!(relates.connects("B", "A", RelationType::Relates));

        let blocks = DependencyEdge::new(id("A"), id("B"), RelationType::Blocks);
        assert!(blocks.connects("A", "B", RelationType::Blocks));
        assert!(!blocks.connects("B", "A", RelationType::Blocks));
        assert!(blocks.joins("B", "A"));
    }

    #[test]
    fn edge_serializes_with_upper_case_relation() {
        let edge = DependencyEdge::new(id("A"), id("B"), RelationType::Blocks);
        let value = serde_json::to_value(&edge).expect("encode");
        assert_eq!(
            value,
            serde_json::json!({"from_task": "A", "to_task": "B", "relation_type": "BLOCKS"})
        );
    }
}
