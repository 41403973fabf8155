use super::edge::{DependencyEdge, RelationType};
use crate::shared::errors::EngineError;
use crate::shared::ids::TaskId;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Edge set for a workspace with forward and reverse `BLOCKS` adjacency.
///
/// Holds three invariants at all times: no self-loop, no duplicate edge and
/// no directed cycle among `BLOCKS` edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    edges: Vec<DependencyEdge>,
    blocks_forward: BTreeMap<TaskId, BTreeSet<TaskId>>,
    blocks_reverse: BTreeMap<TaskId, BTreeSet<TaskId>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskRelationships {
    pub task_id: String,
    pub blocks: Vec<String>,
    pub blocked_by: Vec<String>,
    pub relates: Vec<String>,
    pub duplicates: Vec<String>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a graph from stored edges, applying the same checks as
    /// [`DependencyGraph::link`]. The first edge that fails is returned as the
    /// error.
    pub fn from_edges(
        edges: impl IntoIterator<Item = DependencyEdge>,
    ) -> Result<Self, EngineError> {
        let mut graph = Self::new();
        for edge in edges {
            graph.link(edge)?;
        }
        Ok(graph)
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Validates and inserts `edge`. Checks run in a fixed order: self-loop,
    /// duplicate, then (for `BLOCKS`) reachability.
    pub fn link(&mut self, edge: DependencyEdge) -> Result<&DependencyEdge, EngineError> {
        if edge.from_task == edge.to_task {
            return Err(EngineError::SelfLink {
                task_id: edge.from_task.to_string(),
            });
        }
        if self
            .find(edge.from_task.as_str(), edge.to_task.as_str(), edge.relation_type)
            .is_some()
        {
            return Err(EngineError::DuplicateEdge {
                from_task: edge.from_task.to_string(),
                to_task: edge.to_task.to_string(),
                relation: edge.relation_type.to_string(),
            });
        }
        if edge.relation_type.is_directional() {
            if let Some(path) = self.blocking_path(&edge.to_task, &edge.from_task) {
                return Err(EngineError::CycleDetected {
                    blocker: edge.from_task.to_string(),
                    blocked: edge.to_task.to_string(),
                    path: path.iter().map(ToString::to_string).collect(),
                });
            }
            self.blocks_forward
                .entry(edge.from_task.clone())
                .or_default()
                .insert(edge.to_task.clone());
            self.blocks_reverse
                .entry(edge.to_task.clone())
                .or_default()
                .insert(edge.from_task.clone());
        }
        self.edges.push(edge);
        Ok(&self.edges[self.edges.len() - 1])
    }

    /// Removes the first edge between `a` and `b` in either direction,
    /// optionally restricted to one relation type.
    pub fn unlink(
        &mut self,
        a: &str,
        b: &str,
        relation_type: Option<RelationType>,
    ) -> Option<DependencyEdge> {
        let position = self.edges.iter().position(|edge| {
            edge.joins(a, b) && relation_type.map_or(true, |wanted| edge.relation_type == wanted)
        })?;
        let edge = self.edges.remove(position);
        if edge.relation_type.is_directional() {
            remove_adjacent(&mut self.blocks_forward, &edge.from_task, &edge.to_task);
            remove_adjacent(&mut self.blocks_reverse, &edge.to_task, &edge.from_task);
        }
        Some(edge)
    }

    pub fn find(&self, a: &str, b: &str, relation_type: RelationType) -> Option<&DependencyEdge> {
        self.edges
            .iter()
            .find(|edge| edge.connects(a, b, relation_type))
    }

    /// Iterative depth-first search over `BLOCKS` forward edges. Returns the
    /// path `start -> ... -> target` when `target` is reachable.
    pub fn blocking_path(&self, start: &TaskId, target: &TaskId) -> Option<Vec<TaskId>> {
        if start == target {
            return Some(vec![start.clone()]);
        }
        let mut parents: BTreeMap<&TaskId, &TaskId> = BTreeMap::new();
        let mut visited: BTreeSet<&TaskId> = BTreeSet::from([start]);
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            let Some(next) = self.blocks_forward.get(current) else {
                continue;
            };
            for neighbor in next {
                if !visited.insert(neighbor) {
                    continue;
                }
                parents.insert(neighbor, current);
                if neighbor == target {
                    let mut path = vec![neighbor.clone()];
                    let mut cursor = neighbor;
                    while let Some(parent) = parents.get(cursor) {
                        path.push((*parent).clone());
                        cursor = *parent;
                    }
                    path.reverse();
                    return Some(path);
                }
                stack.push(neighbor);
            }
        }
        None
    }

    pub fn blocked_by(&self, task_id: &str) -> Vec<&TaskId> {
        self.blocks_reverse
            .get(task_id)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    pub fn blocks(&self, task_id: &str) -> Vec<&TaskId> {
        self.blocks_forward
            .get(task_id)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    pub fn relationships(&self, task_id: &str) -> TaskRelationships {
        let mut relationships = TaskRelationships {
            task_id: task_id.to_string(),
            blocks: self.blocks(task_id).iter().map(ToString::to_string).collect(),
            blocked_by: self
                .blocked_by(task_id)
                .iter()
                .map(ToString::to_string)
                .collect(),
            ..TaskRelationships::default()
        };
        for edge in &self.edges {
            let other = if edge.from_task.as_str() == task_id {
                &edge.to_task
            } else if edge.to_task.as_str() == task_id {
                &edge.from_task
            } else {
                continue;
            };
            match edge.relation_type {
                RelationType::Blocks => {}
                RelationType::Relates => relationships.relates.push(other.to_string()),
                RelationType::Duplicates => relationships.duplicates.push(other.to_string()),
            }
        }
        relationships
    }
}

fn remove_adjacent(
    adjacency: &mut BTreeMap<TaskId, BTreeSet<TaskId>>,
    key: &TaskId,
    value: &TaskId,
) {
    if let Some(set) = adjacency.get_mut(key) {
        set.remove(value);
        if set.is_empty() {
            adjacency.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::errors::ErrorKind;

    fn id(raw: &str) -> TaskId {
        TaskId::parse(raw).expect("task id")
    }

    fn blocks(from: &str, to: &str) -> DependencyEdge {
        DependencyEdge::new(id(from), id(to), RelationType::Blocks)
    }

    #[test]
    fn reverse_link_is_a_cycle_with_path() {
        let mut graph = DependencyGraph::new();
        graph.link(blocks("A", "B")).expect("link A->B");
        let err = graph.link(blocks("B", "A")).expect_err("cycle");
        assert_eq!(err.kind(), ErrorKind::CycleDetected);
        match err {
            EngineError::CycleDetected { path, .. } => assert_eq!(path, vec!["A", "B"]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn transitive_cycle_is_detected() {
        let mut graph = DependencyGraph::new();
        graph.link(blocks("A", "B")).expect("A->B");
        graph.link(blocks("B", "C")).expect("B->C");
        graph.link(blocks("C", "D")).expect("C->D");
        let err = graph.link(blocks("D", "A")).expect_err("cycle");
        match err {
            EngineError::CycleDetected { path, .. } => {
                assert_eq!(path, vec!["A", "B", "C", "D"])
            }
            other => panic!("unexpected error: {other}"),
        }
        graph.link(blocks("A", "D")).expect("shortcut is not a cycle");
    }

    #[test]
    fn self_loop_is_rejected_before_anything_else() {
        let mut graph = DependencyGraph::new();
        let err = graph.link(blocks("A", "A")).expect_err("self loop");
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = graph
            .link(DependencyEdge::new(id("A"), id("A"), RelationType::Relates))
            .expect_err("self loop");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn duplicates_conflict_and_symmetric_types_ignore_direction() {
        let mut graph = DependencyGraph::new();
        graph.link(blocks("A", "B")).expect("link");
        assert_eq!(
            graph.link(blocks("A", "B")).expect_err("dup").kind(),
            ErrorKind::Conflict
        );
        graph
            .link(DependencyEdge::new(id("A"), id("B"), RelationType::Relates))
            .expect("different type");
        let err = graph
            .link(DependencyEdge::new(id("B"), id("A"), RelationType::Relates))
            .expect_err("same relationship reversed");
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn unlink_removes_edge_from_both_adjacency_maps() {
        let mut graph = DependencyGraph::new();
        graph.link(blocks("A", "B")).expect("link");
        let removed = graph.unlink("B", "A", None).expect("removed");
        assert_eq!(removed.relation_type, RelationType::Blocks);
        assert!(graph.blocks("A").is_empty());
        assert!(graph.blocked_by("B").is_empty());
        assert!(graph.unlink("A", "B", None).is_none());
        graph.link(blocks("B", "A")).expect("relink in reverse");
    }

    #[test]
    fn unlink_filters_by_relation_type() {
        let mut graph = DependencyGraph::new();
        graph.link(blocks("A", "B")).expect("blocks");
        graph
            .link(DependencyEdge::new(id("A"), id("B"), RelationType::Duplicates))
            .expect("duplicates");
        let removed = graph
            .unlink("A", "B", Some(RelationType::Duplicates))
            .expect("removed");
        assert_eq!(removed.relation_type, RelationType::Duplicates);
        assert_eq!(graph.blocks("A"), vec![&id("B")]);
    }

    #[test]
    fn relationships_group_neighbors_by_type() {
        let mut graph = DependencyGraph::new();
        graph.link(blocks("A", "B")).expect("A->B");
        graph.link(blocks("C", "A")).expect("C->A");
        graph
            .link(DependencyEdge::new(id("D"), id("A"), RelationType::Relates))
            .expect("relates");
        let rel = graph.relationships("A");
        assert_eq!(rel.blocks, vec!["B"]);
        assert_eq!(rel.blocked_by, vec!["C"]);
        assert_eq!(rel.relates, vec!["D"]);
        assert!(rel.duplicates.is_empty());
    }

    #[test]
    fn from_edges_rebuilds_valid_edges() {
        let graph = DependencyGraph::from_edges(vec![blocks("A", "B"), blocks("B", "C")])
            .expect("valid edges");
        assert_eq!(graph.blocks("B").len(), 1);
        assert_eq!(graph.blocked_by("B").len(), 1);
    }

    #[test]
    fn from_edges_rejects_invalid_stored_edges() {
        for edges in [
            vec![blocks("A", "B"), blocks("A", "B")],
            vec![blocks("A", "B"), blocks("B", "A")],
            vec![blocks("C", "C")],
        ] {
            assert!(DependencyGraph::from_edges(edges).is_err());
        }
    }
}
