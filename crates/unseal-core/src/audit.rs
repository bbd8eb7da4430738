// AUDIT LOG
// Append-only record of administrative interventions
//
// SAFETY INVARIANTS:
// 1. Entries are append-only and content-hashed at creation
// 2. Every revert names the admin, the reason, and every affected redaction

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Administrative action being audited
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditAction {
    /// A cascade tree was reverted to its pre-cascade state
    CascadeReverted,

    /// An admin explicitly confirmed a proposal
    AdminConfirmed,

    /// An admin marked a redaction's evidence as false
    AdminDisputed,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CascadeReverted => "cascade_reverted",
            AuditAction::AdminConfirmed => "admin_confirmed",
            AuditAction::AdminDisputed => "admin_disputed",
        }
    }
}

/// One audited administrative intervention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Content hash over the entry payload (hex)
    pub entry_hash: String,

    /// What happened
    pub action: AuditAction,

    /// Admin who acted
    pub actor: String,

    /// Stated reason
    pub reason: String,

    /// Every redaction the action touched
    pub affected_redactions: Vec<String>,

    /// When the action was recorded
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        action: AuditAction,
        actor: impl Into<String>,
        reason: impl Into<String>,
        affected_redactions: Vec<String>,
    ) -> Result<Self, StoreError> {
        let actor = actor.into();
        let reason = reason.into();
        let recorded_at = Utc::now();
        let entry_hash = Self::compute_hash(action, &actor, &reason, &affected_redactions, recorded_at)?;

        Ok(AuditEntry {
            entry_hash,
            action,
            actor,
            reason,
            affected_redactions,
            recorded_at,
        })
    }

    fn compute_hash(
        action: AuditAction,
        actor: &str,
        reason: &str,
        affected_redactions: &[String],
        recorded_at: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let content = (
            action.as_str(),
            actor,
            reason,
            affected_redactions,
            recorded_at.timestamp_nanos_opt().unwrap_or_default(),
        );

        let serialized = serde_json::to_string(&content)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(serialized.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// Recompute the payload hash and compare against the stored one
    pub fn verify_hash(&self) -> Result<bool, StoreError> {
        let computed = Self::compute_hash(
            self.action,
            &self.actor,
            &self.reason,
            &self.affected_redactions,
            self.recorded_at,
        )?;
        Ok(computed == self.entry_hash)
    }
}
