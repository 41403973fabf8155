use serde::{Deserialize, Serialize};

/// Derived per-phase state. Never stored; computed from the state sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseState {
    NotStarted,
    InProgress,
    ReviewRequired,
    Completed,
}

impl PhaseState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::ReviewRequired => "REVIEW_REQUIRED",
            Self::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for PhaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status supplied with a context save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Completed,
    Review,
    Other(String),
}

pub const DEFAULT_SAVE_STATUS: &str = "IN_PROGRESS";

impl SaveStatus {
    /// Case-insensitive; blank or absent input means `IN_PROGRESS`.
    pub fn parse(raw: Option<&str>) -> Self {
        let normalized = raw
            .map(|value| value.trim().to_ascii_uppercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_SAVE_STATUS.to_string());
        match normalized.as_str() {
            "COMPLETED" | "COMPLETE" | "DONE" => Self::Completed,
            "REVIEW" | "IN_REVIEW" => Self::Review,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Review => "REVIEW",
            Self::Other(value) => value,
        }
    }
}

/// Result of applying one save to a phase that has been started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveEffect {
    pub next: PhaseState,
    /// A completion was requested but the review gate held it back.
    pub review_gate_held: bool,
}

/// Transition table for a save on a phase already in `current`.
/// `NotStarted` is treated as `InProgress`: the first save starts the phase
/// before the status is applied.
pub fn after_save(current: PhaseState, status: &SaveStatus, requires_review: bool) -> SaveEffect {
    let current = match current {
        PhaseState::NotStarted => PhaseState::InProgress,
        other => other,
    };
    let next = match (current, status) {
        (PhaseState::Completed, _) => PhaseState::Completed,
        (PhaseState::ReviewRequired, SaveStatus::Completed) => PhaseState::Completed,
        (PhaseState::ReviewRequired, _) => PhaseState::InProgress,
        (PhaseState::InProgress, SaveStatus::Review) if requires_review => {
            PhaseState::ReviewRequired
        }
        (PhaseState::InProgress, SaveStatus::Completed) if !requires_review => {
            PhaseState::Completed
        }
        (state, _) => state,
    };
    SaveEffect {
        next,
        review_gate_held: current == PhaseState::InProgress
            && requires_review
            && *status == SaveStatus::Completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_accepts_aliases() {
        assert_eq!(SaveStatus::parse(Some(" done ")), SaveStatus::Completed);
        assert_eq!(SaveStatus::parse(Some("complete")), SaveStatus::Completed);
        assert_eq!(SaveStatus::parse(Some("in_review")), SaveStatus::Review);
        assert_eq!(
            SaveStatus::parse(None),
            SaveStatus::Other("IN_PROGRESS".to_string())
        );
        assert_eq!(
            SaveStatus::parse(Some("  ")),
            SaveStatus::Other("IN_PROGRESS".to_string())
        );
        assert_eq!(
            SaveStatus::parse(Some("blocked")).as_str(),
            "BLOCKED"
        );
    }

    #[test]
    fn plain_phase_completes_directly() {
        let effect = after_save(PhaseState::NotStarted, &SaveStatus::Completed, false);
        assert_eq!(effect.next, PhaseState::Completed);
        assert!(!effect.review_gate_held);
    }

    #[test]
    fn review_phase_needs_review_before_completion() {
        let held = after_save(PhaseState::InProgress, &SaveStatus::Completed, true);
        assert_eq!(held.next, PhaseState::InProgress);
        assert!(held.review_gate_held);

        let review = after_save(PhaseState::InProgress, &SaveStatus::Review, true);
        assert_eq!(review.next, PhaseState::ReviewRequired);

        let done = after_save(PhaseState::ReviewRequired, &SaveStatus::Completed, true);
        assert_eq!(done.next, PhaseState::Completed);
    }

    #[test]
    fn review_rework_returns_to_in_progress() {
        let effect = after_save(
            PhaseState::ReviewRequired,
            &SaveStatus::Other("IN_PROGRESS".to_string()),
            true,
        );
        assert_eq!(effect.next, PhaseState::InProgress);
    }

    #[test]
    fn review_status_on_plain_phase_is_progress_update() {
        let effect = after_save(PhaseState::InProgress, &SaveStatus::Review, false);
        assert_eq!(effect.next, PhaseState::InProgress);
    }

    #[test]
    fn completed_is_terminal() {
        for status in [
            SaveStatus::Review,
            SaveStatus::Other("IN_PROGRESS".to_string()),
            SaveStatus::Completed,
        ] {
            assert_eq!(
                after_save(PhaseState::Completed, &status, true).next,
                PhaseState::Completed
            );
        }
    }
}
