use super::phase_state::PhaseState;
use crate::shared::ids::{TaskId, WorkflowId};
use crate::shared::metadata::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Insertion-ordered set of phase names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseSet(Vec<String>);

impl PhaseSet {
    pub fn contains(&self, phase: &str) -> bool {
        self.0.iter().any(|existing| existing == phase)
    }

    /// Returns false when the phase was already present.
    pub fn insert(&mut self, phase: &str) -> bool {
        if self.contains(phase) {
            return false;
        }
        self.0.push(phase.to_string());
        true
    }

    pub fn remove(&mut self, phase: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != phase);
        self.0.len() != before
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub sequence: u64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// A context entry paired with the phase it was recorded under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseEntry {
    pub phase: String,
    #[serde(flatten)]
    pub entry: ContextEntry,
}

/// Durable per-task record. One per task id, replaced whole on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub task_id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default)]
    pub started_phases: PhaseSet,
    #[serde(default)]
    pub review_phases: PhaseSet,
    #[serde(default)]
    pub completed_phases: PhaseSet,
    #[serde(default)]
    pub contexts: BTreeMap<String, Vec<ContextEntry>>,
    #[serde(default)]
    pub artifacts: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    pub fn new(task_id: TaskId, now: DateTime<Utc>) -> Self {
        Self {
            task_id,
            workflow_id: None,
            started_phases: PhaseSet::default(),
            review_phases: PhaseSet::default(),
            completed_phases: PhaseSet::default(),
            contexts: BTreeMap::new(),
            artifacts: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn phase_state(&self, phase: &str) -> PhaseState {
        if self.completed_phases.contains(phase) {
            PhaseState::Completed
        } else if self.review_phases.contains(phase) {
            PhaseState::ReviewRequired
        } else if self.started_phases.contains(phase) {
            PhaseState::InProgress
        } else {
            PhaseState::NotStarted
        }
    }

    /// Moves `phase` into `target`, keeping the set invariants:
    /// completed and review are subsets of started and never overlap.
    pub fn set_phase_state(&mut self, phase: &str, target: PhaseState) {
        match target {
            PhaseState::NotStarted => {
                self.started_phases.remove(phase);
                self.review_phases.remove(phase);
                self.completed_phases.remove(phase);
            }
            PhaseState::InProgress => {
                self.started_phases.insert(phase);
                self.review_phases.remove(phase);
                self.completed_phases.remove(phase);
            }
            PhaseState::ReviewRequired => {
                self.started_phases.insert(phase);
                self.completed_phases.remove(phase);
                self.review_phases.insert(phase);
            }
            PhaseState::Completed => {
                self.started_phases.insert(phase);
                self.review_phases.remove(phase);
                self.completed_phases.insert(phase);
            }
        }
    }

    /// Drops phase progress. Contexts and artifacts are kept.
    pub fn reset_progress(&mut self) {
        self.started_phases.clear();
        self.review_phases.clear();
        self.completed_phases.clear();
    }

    pub fn next_sequence(&self) -> u64 {
        self.contexts
            .values()
            .flatten()
            .map(|entry| entry.sequence)
            .max()
            .map_or(1, |last| last + 1)
    }

    pub fn append_entry(&mut self, phase: &str, entry: ContextEntry) {
        self.contexts
            .entry(phase.to_string())
            .or_default()
            .push(entry);
    }

    pub fn entry_count(&self, phase: &str) -> usize {
        self.contexts.get(phase).map_or(0, Vec::len)
    }

    /// Entries in the order they were recorded, optionally for one phase.
    pub fn entries(&self, phase: Option<&str>) -> Vec<PhaseEntry> {
        let mut entries = self
            .contexts
            .iter()
            .filter(|(name, _)| phase.map_or(true, |wanted| wanted == name.as_str()))
            .flat_map(|(name, entries)| {
                entries.iter().map(move |entry| PhaseEntry {
                    phase: name.clone(),
                    entry: entry.clone(),
                })
            })
            .collect::<Vec<_>>();
        entries.sort_by_key(|item| (item.entry.sequence, item.entry.timestamp));
        entries
    }

    pub fn merge_artifacts(&mut self, artifacts: BTreeMap<String, String>) {
        self.artifacts.extend(artifacts);
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, second)
            .single()
            .expect("valid timestamp")
    }

    fn entry(sequence: u64, content: &str) -> ContextEntry {
        ContextEntry {
            sequence,
            content: content.to_string(),
            timestamp: at(sequence as u32),
            status: None,
            metadata: Metadata::default(),
        }
    }

    #[test]
    fn phase_state_precedence_follows_completed_review_started() {
        let mut state = WorkflowState::new(TaskId::parse("T-1").expect("id"), at(0));
        assert_eq!(state.phase_state("review"), PhaseState::NotStarted);
        state.set_phase_state("review", PhaseState::InProgress);
        assert_eq!(state.phase_state("review"), PhaseState::InProgress);
        state.set_phase_state("review", PhaseState::ReviewRequired);
        assert_eq!(state.phase_state("review"), PhaseState::ReviewRequired);
        state.set_phase_state("review", PhaseState::Completed);
        assert_eq!(state.phase_state("review"), PhaseState::Completed);
        assert!(!state.review_phases.contains("review"));
        assert!(state.started_phases.contains("review"));
    }

    #[test]
    fn entries_are_ordered_by_sequence_across_phases() {
        let mut state = WorkflowState::new(TaskId::parse("T-1").expect("id"), at(0));
        state.append_entry("test", entry(2, "second"));
        state.append_entry("planning", entry(1, "first"));
        state.append_entry("test", entry(3, "third"));

        let all = state
            .entries(None)
            .into_iter()
            .map(|item| item.entry.content)
            .collect::<Vec<_>>();
        assert_eq!(all, vec!["first", "second", "third"]);
        assert_eq!(state.entries(Some("test")).len(), 2);
        assert_eq!(state.next_sequence(), 4);
    }

    #[test]
    fn phase_set_ignores_duplicates_and_keeps_order() {
        let mut set = PhaseSet::default();
        assert!(set.insert("b"));
        assert!(set.insert("a"));
        assert!(!set.insert("b"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = WorkflowState::new(TaskId::parse("T-1").expect("id"), at(0));
        state.workflow_id = Some(WorkflowId::parse("task").expect("id"));
        state.set_phase_state("planning", PhaseState::Completed);
        state.append_entry("planning", entry(1, "plan"));
        let encoded = serde_json::to_string(&state).expect("encode");
        let decoded: WorkflowState = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, state);
    }
}
