// VOTE AGGREGATOR
// Last-vote-wins per voter, tallies recomputed from the authoritative rows
//
// SAFETY INVARIANTS:
// 1. Upsert, recount, rescore, and any resulting status transition commit as
//    one serializable transaction
// 2. Tallies are recounted from vote rows, never incremented in place, so
//    concurrent votes from different users cannot lose updates
// 3. Authors never vote on their own proposals
// 4. Voting closes once the redaction is confirmed or disputed
// 5. Reaching the corroboration quorum always moves the redaction to
//    corroborated (or it is already confirmed)

use crate::cascade_propagator::{propagate, CascadeOutcome};
use crate::config::ConsensusConfig;
use crate::confidence::composite_confidence;
use crate::error::EngineError;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use unseal_core::{ConsensusStore, RedactionStatus, UserRef, Vote, VoteTally, VoteType};

/// What a single vote did: the recorded vote, the fresh tallies, and whether
/// it pushed the redaction over the auto-confirm threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub vote: Vote,
    pub tallies: VoteTally,
    pub auto_confirmed: bool,
    pub cascade_count: u32,
}

pub struct VoteAggregator {
    store: Arc<ConsensusStore>,
    config: ConsensusConfig,
}

impl VoteAggregator {
    pub fn new(store: Arc<ConsensusStore>, config: ConsensusConfig) -> Self {
        VoteAggregator { store, config }
    }

    /// Record (or replace) a voter's reaction to a proposal and drive any
    /// consensus transition that follows from the new tally.
    pub fn cast_vote(
        &self,
        redaction_id: &str,
        proposal_id: &str,
        voter: &UserRef,
        vote_type: VoteType,
    ) -> Result<VoteOutcome, EngineError> {
        self.store.with_write(|state| {
            let proposal = state.proposal(proposal_id).map_err(EngineError::from_store)?;
            if proposal.redaction_id != redaction_id {
                return Err(EngineError::Validation(format!(
                    "proposal {} does not belong to redaction {}",
                    proposal_id, redaction_id
                )));
            }
            if proposal.author == voter.id {
                return Err(EngineError::Forbidden(
                    "voting on your own proposal is not allowed".to_string(),
                ));
            }
            let proposed_text = proposal.proposed_text.clone();
            let evidence_type = proposal.evidence_type;
            let length_match = proposal.length_match;

            let redaction = state.redaction(redaction_id).map_err(EngineError::from_store)?;
            let status = redaction.status;
            if status.is_terminal() {
                return Err(EngineError::Conflict(format!(
                    "redaction {} is {}; voting is closed",
                    redaction_id, status
                )));
            }

            // Upsert, then recount from the rows within the same transaction
            let vote = Vote::new(proposal_id, voter.id.clone(), vote_type);
            state.upsert_vote(vote.clone());
            let tallies = state.count_votes(proposal_id);

            let confidence =
                composite_confidence(&self.config, evidence_type, &tallies, length_match);
            {
                let proposal = state.proposal_mut(proposal_id).map_err(EngineError::from_store)?;
                proposal.apply_tally(tallies);
                proposal.composite_confidence = confidence;
            }

            let mut status = status;
            if tallies.corroborations >= self.config.corroboration_quorum
                && matches!(
                    status,
                    RedactionStatus::Unsolved | RedactionStatus::Proposed
                )
            {
                state
                    .compare_and_transition(
                        redaction_id,
                        RedactionStatus::Corroborated,
                        &[RedactionStatus::Unsolved, RedactionStatus::Proposed],
                    )
                    .map_err(EngineError::from_store)?;
                status = RedactionStatus::Corroborated;
            }

            let mut auto_confirmed = false;
            let mut cascade_count = 0;
            if confidence >= self.config.auto_confirm_threshold
                && matches!(
                    status,
                    RedactionStatus::Proposed | RedactionStatus::Corroborated
                )
            {
                let prior = status;
                state
                    .confirm_with_text(redaction_id, &proposed_text, &[prior])
                    .map_err(EngineError::from_store)?;
                let outcome: CascadeOutcome =
                    propagate(state, &self.config, redaction_id, &proposed_text, prior)?;
                auto_confirmed = true;
                cascade_count = outcome.cascade_count;
                info!(
                    "proposal {} auto-confirmed redaction {} at confidence {:.2} ({} cascaded)",
                    proposal_id, redaction_id, confidence, cascade_count
                );
            }

            Ok(VoteOutcome {
                vote,
                tallies,
                auto_confirmed,
                cascade_count,
            })
        })
    }
}
