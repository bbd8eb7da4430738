// CASCADE PROPAGATOR
// Applies a confirmed resolution to every matching redaction across the corpus
//
// SAFETY INVARIANTS:
// 1. The whole scan-and-flip runs inside the caller's write transaction:
//    every matched redaction flips together with its recorded node, or none do
// 2. Each node snapshots the redaction's status before it is flipped
// 3. Redactions already in an active cascade are never claimed by another
// 4. Propagation is idempotent: a re-run on a recorded root creates nothing new
// 5. Depth is capped; deeper chains require a fresh human-confirmed root

use crate::config::ConsensusConfig;
use crate::error::EngineError;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use unseal_core::{CascadeNode, CascadeRecord, RedactionStatus, StoreState};

/// Result of one propagation, root included in the affected documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeOutcome {
    pub root_redaction_id: String,
    pub cascade_count: u32,
    pub affected_document_ids: Vec<String>,
}

impl CascadeOutcome {
    fn from_record(record: &CascadeRecord) -> Self {
        CascadeOutcome {
            root_redaction_id: record.root_redaction_id.clone(),
            cascade_count: record.cascade_count(),
            affected_document_ids: record.affected_document_ids(),
        }
    }
}

/// Normalize OCR context into comparable tokens: lowercase, alphanumeric only.
/// Hyphenation, casing, and stray punctuation vary per page; token sets do not.
fn normalized_tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Jaccard similarity of the normalized token sets of two context strings
pub fn context_similarity(a: &str, b: &str) -> f64 {
    let ta = normalized_tokens(a);
    let tb = normalized_tokens(b);
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let intersection = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    intersection / union
}

/// Propagate a confirmed resolution from `root_redaction_id` (already
/// confirmed by the caller, within the same transaction) to every compatible
/// redaction. `root_prior_status` is the root's status from immediately
/// before its confirmation.
pub fn propagate(
    state: &mut StoreState,
    config: &ConsensusConfig,
    root_redaction_id: &str,
    confirmed_text: &str,
    root_prior_status: RedactionStatus,
) -> Result<CascadeOutcome, EngineError> {
    // Re-running the scan on an already-recorded root is a no-op
    if let Some(record) = state.cascade(root_redaction_id) {
        if record.active {
            return Ok(CascadeOutcome::from_record(record));
        }
    }

    let root = state
        .redaction(root_redaction_id)
        .map_err(EngineError::from_store)?;

    let root_node = CascadeNode::new(
        root_redaction_id,
        root_redaction_id,
        None,
        0,
        confirmed_text,
        root.document_id.clone(),
        root_prior_status,
    )?;

    let target_len = confirmed_text.chars().count() as i64;
    let slack = i64::from(config.length_slack);

    // Collect the full match set before flipping anything. Each pass scans
    // from the previous pass's matches; claimed ids are never re-matched.
    let mut claimed: HashSet<String> = HashSet::new();
    claimed.insert(root_redaction_id.to_string());

    let mut nodes = vec![root_node.clone()];
    // (node id, context to match against)
    let mut frontier = vec![(root_node.id.clone(), root.surrounding_text.clone())];

    for depth in 1..=config.max_cascade_depth {
        let mut next_frontier = Vec::new();

        for (anchor_node_id, anchor_context) in &frontier {
            let matches: Vec<(String, String, RedactionStatus, String)> = state
                .redactions()
                .filter(|r| !claimed.contains(&r.id))
                .filter(|r| !r.status.is_terminal())
                .filter(|r| !state.in_active_cascade(&r.id))
                .filter(|r| {
                    r.char_length_estimate
                        .map(|estimate| (i64::from(estimate) - target_len).abs() <= slack)
                        .unwrap_or(false)
                })
                .filter(|r| {
                    context_similarity(anchor_context, &r.surrounding_text)
                        >= config.context_similarity_threshold
                })
                .map(|r| {
                    (
                        r.id.clone(),
                        r.document_id.clone(),
                        r.status,
                        r.surrounding_text.clone(),
                    )
                })
                .collect();

            for (id, document_id, prior_status, context) in matches {
                claimed.insert(id.clone());
                let node = CascadeNode::new(
                    root_redaction_id,
                    &id,
                    Some(anchor_node_id.clone()),
                    depth,
                    confirmed_text,
                    document_id,
                    prior_status,
                )?;
                next_frontier.push((node.id.clone(), context));
                nodes.push(node);
            }
        }

        if next_frontier.is_empty() {
            break;
        }
        frontier = next_frontier;
    }

    // Apply phase: flip every match and record the tree together
    for node in nodes.iter().filter(|n| n.depth > 0) {
        state
            .confirm_with_text(&node.redaction_id, confirmed_text, &[node.prior_status])
            .map_err(EngineError::from_store)?;
    }

    let record = CascadeRecord::new(root_redaction_id, confirmed_text, nodes);
    let outcome = CascadeOutcome::from_record(&record);
    state.insert_cascade(record);

    info!(
        "cascade from {} resolved {} redactions across {} documents",
        root_redaction_id,
        outcome.cascade_count,
        outcome.affected_document_ids.len()
    );

    Ok(outcome)
}
