use thiserror::Error;
use unseal_core::StoreError;

/// Engine-level failures surfaced to the host application. Validation names
/// the violated constraint; Conflict means the caller holds stale redaction
/// state and may retry after refetching; nothing is retried internally.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("redaction not found: {0}")]
    RedactionNotFound(String),

    #[error("proposal not found: {0}")]
    ProposalNotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl EngineError {
    /// Map store lookup failures to the engine taxonomy, leaving everything
    /// else as a storage error.
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::RedactionNotFound(id) => EngineError::RedactionNotFound(id),
            StoreError::ProposalNotFound(id) => EngineError::ProposalNotFound(id),
            StoreError::StatusConflict { id, current } => EngineError::Conflict(format!(
                "redaction {} is currently {}; refresh and retry",
                id, current
            )),
            other => EngineError::Storage(other),
        }
    }
}
