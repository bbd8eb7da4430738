// REDACTION SLOTS
// Canonical state of each redacted span, with a guarded status state machine
//
// SAFETY INVARIANTS:
// 1. Status is mutated only through the store's compare-and-transition primitive
// 2. Every legal transition is listed in ALLOWED_TRANSITIONS; nothing else passes
// 3. Confirmed and Disputed are terminal unless explicitly reverted by an admin
// 4. Every transition is appended to the redaction's status history
// 5. Redactions are never deleted

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consensus status of a redaction slot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RedactionStatus {
    /// No proposal submitted yet
    Unsolved,

    /// At least one proposal exists
    Proposed,

    /// A proposal has reached the corroboration quorum
    Corroborated,

    /// Resolution accepted (threshold or admin); voting closed
    Confirmed,

    /// Evidence deemed false by an admin; voting closed
    Disputed,
}

/// Legal status transitions. The dispute rows cover every non-terminal state;
/// the revert path (Confirmed back to a snapshotted prior status) bypasses
/// this table through the store's restore primitive, admin-only.
pub const ALLOWED_TRANSITIONS: &[(RedactionStatus, RedactionStatus)] = &[
    (RedactionStatus::Unsolved, RedactionStatus::Proposed),
    (RedactionStatus::Unsolved, RedactionStatus::Corroborated),
    (RedactionStatus::Proposed, RedactionStatus::Corroborated),
    (RedactionStatus::Proposed, RedactionStatus::Confirmed),
    (RedactionStatus::Corroborated, RedactionStatus::Confirmed),
    (RedactionStatus::Unsolved, RedactionStatus::Disputed),
    (RedactionStatus::Proposed, RedactionStatus::Disputed),
    (RedactionStatus::Corroborated, RedactionStatus::Disputed),
];

impl RedactionStatus {
    /// Check if status is terminal (no further voting or proposals)
    pub fn is_terminal(&self) -> bool {
        matches!(self, RedactionStatus::Confirmed | RedactionStatus::Disputed)
    }

    /// Check the transition table
    pub fn can_transition(from: RedactionStatus, to: RedactionStatus) -> bool {
        ALLOWED_TRANSITIONS.contains(&(from, to))
    }

    /// Get human-readable status name
    pub fn as_str(&self) -> &'static str {
        match self {
            RedactionStatus::Unsolved => "unsolved",
            RedactionStatus::Proposed => "proposed",
            RedactionStatus::Corroborated => "corroborated",
            RedactionStatus::Confirmed => "confirmed",
            RedactionStatus::Disputed => "disputed",
        }
    }
}

impl fmt::Display for RedactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one status transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTransition {
    /// Previous status
    pub from: RedactionStatus,

    /// New status
    pub to: RedactionStatus,

    /// When the transition was applied
    pub at: DateTime<Utc>,
}

/// One physically redacted span in one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redaction {
    /// Unique redaction ID (assigned at ingestion)
    pub id: String,

    /// Document this redaction belongs to
    pub document_id: String,

    /// Page number within the document
    pub page: u32,

    /// OCR context around the redaction mark, used for cross-document matching
    pub surrounding_text: String,

    /// Pixel-width-derived guess of the hidden character count, when available
    pub char_length_estimate: Option<u32>,

    /// Current consensus status
    pub status: RedactionStatus,

    /// Resolved text once confirmed, cleared again on revert
    pub resolved_text: Option<String>,

    /// Status transition history
    pub status_history: Vec<StatusTransition>,
}

impl Redaction {
    /// Create a new unsolved redaction slot
    pub fn new(
        id: impl Into<String>,
        document_id: impl Into<String>,
        page: u32,
        surrounding_text: impl Into<String>,
        char_length_estimate: Option<u32>,
    ) -> Self {
        Redaction {
            id: id.into(),
            document_id: document_id.into(),
            page,
            surrounding_text: surrounding_text.into(),
            char_length_estimate,
            status: RedactionStatus::Unsolved,
            resolved_text: None,
            status_history: Vec::new(),
        }
    }

    pub(crate) fn record_transition(&mut self, to: RedactionStatus) {
        self.status_history.push(StatusTransition {
            from: self.status,
            to,
            at: Utc::now(),
        });
        self.status = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(RedactionStatus::Confirmed.is_terminal());
        assert!(RedactionStatus::Disputed.is_terminal());
        assert!(!RedactionStatus::Unsolved.is_terminal());
        assert!(!RedactionStatus::Proposed.is_terminal());
        assert!(!RedactionStatus::Corroborated.is_terminal());
    }

    #[test]
    fn test_transition_table() {
        assert!(RedactionStatus::can_transition(
            RedactionStatus::Unsolved,
            RedactionStatus::Proposed,
        ));
        assert!(RedactionStatus::can_transition(
            RedactionStatus::Proposed,
            RedactionStatus::Corroborated,
        ));
        assert!(RedactionStatus::can_transition(
            RedactionStatus::Corroborated,
            RedactionStatus::Confirmed,
        ));

        // No regression, no skipping out of terminal states
        assert!(!RedactionStatus::can_transition(
            RedactionStatus::Confirmed,
            RedactionStatus::Proposed,
        ));
        assert!(!RedactionStatus::can_transition(
            RedactionStatus::Disputed,
            RedactionStatus::Unsolved,
        ));
        assert!(!RedactionStatus::can_transition(
            RedactionStatus::Corroborated,
            RedactionStatus::Proposed,
        ));
    }

    #[test]
    fn test_every_non_terminal_can_be_disputed() {
        for status in [
            RedactionStatus::Unsolved,
            RedactionStatus::Proposed,
            RedactionStatus::Corroborated,
        ] {
            assert!(RedactionStatus::can_transition(
                status,
                RedactionStatus::Disputed,
            ));
        }
    }

    #[test]
    fn test_transition_history_recorded() {
        let mut redaction = Redaction::new("r1", "doc1", 4, "flight to the island", Some(8));
        assert_eq!(redaction.status, RedactionStatus::Unsolved);

        redaction.record_transition(RedactionStatus::Proposed);
        redaction.record_transition(RedactionStatus::Corroborated);

        assert_eq!(redaction.status, RedactionStatus::Corroborated);
        assert_eq!(redaction.status_history.len(), 2);
        assert_eq!(redaction.status_history[0].from, RedactionStatus::Unsolved);
        assert_eq!(redaction.status_history[1].to, RedactionStatus::Corroborated);
    }
}
