// Consensus policy knobs. Everything here is host-tunable; the defaults are
// the documented production policy.

use serde::{Deserialize, Serialize};

/// Composite confidence at or above which a proposal auto-confirms its redaction.
pub const DEFAULT_AUTO_CONFIRM_THRESHOLD: f64 = 0.75;

/// Corroborations required to move a redaction to corroborated.
pub const DEFAULT_CORROBORATION_QUORUM: u32 = 3;

/// Slack (characters) tolerated between a guess and the pixel-width estimate.
pub const DEFAULT_LENGTH_SLACK: u32 = 3;

/// Minimum Jaccard similarity of normalized context tokens for cascade matching.
pub const DEFAULT_CONTEXT_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Maximum cascade depth; deeper chains need a fresh human-confirmed root.
pub const DEFAULT_MAX_CASCADE_DEPTH: u32 = 2;

/// Consensus engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Auto-confirm threshold on composite confidence
    pub auto_confirm_threshold: f64,

    /// Corroboration quorum
    pub corroboration_quorum: u32,

    /// Length-match slack in characters
    pub length_slack: u32,

    /// Context-similarity gate for cascade matching
    pub context_similarity_threshold: f64,

    /// Cascade depth cap
    pub max_cascade_depth: u32,

    /// Proposal text length bounds
    pub min_text_len: usize,
    pub max_text_len: usize,

    /// Evidence description length bounds
    pub min_evidence_len: usize,
    pub max_evidence_len: usize,

    /// Evidence source list bound
    pub max_evidence_sources: usize,

    /// Supporting chunk list bound
    pub max_supporting_chunks: usize,

    /// Revert reason length bounds
    pub min_reason_len: usize,
    pub max_reason_len: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            auto_confirm_threshold: DEFAULT_AUTO_CONFIRM_THRESHOLD,
            corroboration_quorum: DEFAULT_CORROBORATION_QUORUM,
            length_slack: DEFAULT_LENGTH_SLACK,
            context_similarity_threshold: DEFAULT_CONTEXT_SIMILARITY_THRESHOLD,
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
            min_text_len: 1,
            max_text_len: 1000,
            min_evidence_len: 10,
            max_evidence_len: 5000,
            max_evidence_sources: 10,
            max_supporting_chunks: 20,
            min_reason_len: 5,
            max_reason_len: 2000,
        }
    }
}
