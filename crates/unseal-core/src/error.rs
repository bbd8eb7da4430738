use crate::redaction::RedactionStatus;
use thiserror::Error;

/// Store-level failures. Status conflicts are surfaced, never silently
/// no-opped, so concurrent transition attempts are safely serialized.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redaction not found: {0}")]
    RedactionNotFound(String),

    #[error("proposal not found: {0}")]
    ProposalNotFound(String),

    #[error("duplicate redaction id: {0}")]
    DuplicateRedaction(String),

    #[error("status conflict on redaction {id}: currently {current}")]
    StatusConflict {
        id: String,
        current: RedactionStatus,
    },

    #[error("illegal status transition {from} -> {to}")]
    IllegalTransition {
        from: RedactionStatus,
        to: RedactionStatus,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}
