// COMPOSITE CONFIDENCE SCORING
// Blends evidence-type weight, crowd agreement, and physical plausibility
// into one bounded score
//
// SAFETY INVARIANTS:
// 1. The score is always clamped to [0, 1]
// 2. Each term is independently bounded, so no single evidence signal can
//    force auto-confirmation on its own
// 3. The score is a pure function of (evidence weight, tally, length match)

use crate::config::ConsensusConfig;
use unseal_core::{EvidenceType, VoteTally};

/// Cap on the corroboration term once the quorum is saturated.
const CORROBORATION_TERM_CAP: f64 = 0.15;

/// Cap on the net-approval term.
const APPROVAL_TERM_CAP: f64 = 0.10;

/// Net upvotes at which the approval term saturates.
const NET_APPROVAL_SATURATION: f64 = 5.0;

/// Bonus (or penalty, when negated) for the length-match signal.
const LENGTH_MATCH_TERM: f64 = 0.15;

/// Composite confidence for a proposal given its current tally.
///
/// `evidence_weight + 0.15 * min(1, corroborations/quorum)
///  + 0.10 * min(1, max(0, up - down)/5) ± length term`, clamped to [0, 1].
pub fn composite_confidence(
    config: &ConsensusConfig,
    evidence_type: EvidenceType,
    tally: &VoteTally,
    length_match: Option<bool>,
) -> f64 {
    let corroboration_term = CORROBORATION_TERM_CAP
        * (tally.corroborations as f64 / config.corroboration_quorum.max(1) as f64).min(1.0);

    let net_up = tally.upvotes.saturating_sub(tally.downvotes) as f64;
    let approval_term = APPROVAL_TERM_CAP * (net_up / NET_APPROVAL_SATURATION).min(1.0);

    let length_term = match length_match {
        Some(true) => LENGTH_MATCH_TERM,
        Some(false) => -LENGTH_MATCH_TERM,
        None => 0.0,
    };

    (evidence_type.weight() + corroboration_term + approval_term + length_term).clamp(0.0, 1.0)
}
