// CASCADE TREES
// Records of resolutions propagated from one confirmed redaction to its matches
//
// SAFETY INVARIANTS:
// 1. Each node snapshots the redaction's status at propagation time; revert
//    restores from the snapshot, never re-derives
// 2. Depth strictly increases from parent to child; the root is depth 0
// 3. A redaction appears in at most one active cascade at a time
// 4. Revert tombstones the record (active = false) rather than deleting it

use crate::error::StoreError;
use crate::redaction::RedactionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// One redaction resolved as part of a cascade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeNode {
    /// Unique node ID (hex content hash of root + redaction)
    pub id: String,

    /// The originally confirmed redaction at the root of the tree
    pub root_redaction_id: String,

    /// The redaction this node resolved
    pub redaction_id: String,

    /// Parent node ID; None for the root node
    pub parent: Option<String>,

    /// Distance from the root (0 = the root itself)
    pub depth: u32,

    /// Text applied to this redaction
    pub resolved_text: String,

    /// Document the redaction belongs to
    pub document_id: String,

    /// Status the redaction held immediately before the cascade touched it
    pub prior_status: RedactionStatus,
}

impl CascadeNode {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        root_redaction_id: impl Into<String>,
        redaction_id: impl Into<String>,
        parent: Option<String>,
        depth: u32,
        resolved_text: impl Into<String>,
        document_id: impl Into<String>,
        prior_status: RedactionStatus,
    ) -> Result<Self, StoreError> {
        let root_redaction_id = root_redaction_id.into();
        let redaction_id = redaction_id.into();
        let id = Self::compute_id(&root_redaction_id, &redaction_id)?;

        Ok(CascadeNode {
            id,
            root_redaction_id,
            redaction_id,
            parent,
            depth,
            resolved_text: resolved_text.into(),
            document_id: document_id.into(),
            prior_status,
        })
    }

    fn compute_id(root_redaction_id: &str, redaction_id: &str) -> Result<String, StoreError> {
        let serialized = bincode::serialize(&(root_redaction_id, redaction_id))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&serialized);
        Ok(hex::encode(hasher.finalize()))
    }
}

/// The full cascade tree rooted at one confirmed redaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeRecord {
    /// Root redaction ID
    pub root_redaction_id: String,

    /// Text that was propagated
    pub confirmed_text: String,

    /// All nodes in the tree, root included at depth 0
    pub nodes: Vec<CascadeNode>,

    /// False once reverted
    pub active: bool,

    /// Propagation time
    pub created_at: DateTime<Utc>,
}

impl CascadeRecord {
    pub fn new(
        root_redaction_id: impl Into<String>,
        confirmed_text: impl Into<String>,
        nodes: Vec<CascadeNode>,
    ) -> Self {
        CascadeRecord {
            root_redaction_id: root_redaction_id.into(),
            confirmed_text: confirmed_text.into(),
            nodes,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Number of redactions resolved as a side effect (root excluded)
    pub fn cascade_count(&self) -> u32 {
        self.nodes.iter().filter(|n| n.depth > 0).count() as u32
    }

    /// Distinct documents touched by the tree, root's document included
    pub fn affected_document_ids(&self) -> Vec<String> {
        let docs: BTreeSet<&str> = self.nodes.iter().map(|n| n.document_id.as_str()).collect();
        docs.into_iter().map(String::from).collect()
    }

    /// All redaction IDs in the tree, in node order (root first)
    pub fn affected_redaction_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.redaction_id.clone()).collect()
    }
}
