// PROPOSAL MANAGER
// Validates and records a user's guess for a redaction's contents
//
// SAFETY INVARIANTS:
// 1. Validation completes before the first write; a rejected submission
//    leaves the store untouched
// 2. The unsolved -> proposed transition fires at most once per redaction,
//    even under concurrent first submissions
// 3. Competing proposals may coexist on a proposed or corroborated redaction
// 4. Submission never triggers cascade logic

use crate::config::ConsensusConfig;
use crate::confidence::composite_confidence;
use crate::error::EngineError;
use log::{debug, info};
use std::sync::Arc;
use unseal_core::{
    ConsensusStore, EvidenceType, Proposal, RedactionStatus, StoreError, UserRef, VoteTally,
};

pub struct ProposalManager {
    store: Arc<ConsensusStore>,
    config: ConsensusConfig,
}

impl ProposalManager {
    pub fn new(store: Arc<ConsensusStore>, config: ConsensusConfig) -> Self {
        ProposalManager { store, config }
    }

    /// Submit a candidate resolution for a redaction.
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        &self,
        redaction_id: &str,
        author: &UserRef,
        text: &str,
        linked_entity_id: Option<String>,
        evidence_type: EvidenceType,
        evidence_description: &str,
        evidence_sources: Vec<String>,
        supporting_chunk_ids: Vec<String>,
    ) -> Result<Proposal, EngineError> {
        self.validate(text, evidence_description, &evidence_sources, &supporting_chunk_ids)?;

        self.store.with_write(|state| {
            let redaction = state.redaction(redaction_id).map_err(EngineError::from_store)?;
            let status = redaction.status;
            if status.is_terminal() {
                return Err(EngineError::Conflict(format!(
                    "redaction {} is already {}; no further proposals accepted",
                    redaction_id, status
                )));
            }

            // OCR width estimation is noisy; a few characters of slack keeps
            // honest guesses from being penalized
            let length_match = redaction.char_length_estimate.map(|estimate| {
                let guess_len = text.chars().count() as i64;
                (guess_len - i64::from(estimate)).abs() <= i64::from(self.config.length_slack)
            });

            let mut proposal = Proposal::new(
                redaction_id,
                author.id.clone(),
                text,
                linked_entity_id,
                evidence_type,
                evidence_description,
                evidence_sources,
                supporting_chunk_ids,
                length_match,
            )?;

            proposal.composite_confidence = composite_confidence(
                &self.config,
                evidence_type,
                &VoteTally::default(),
                length_match,
            );

            state.insert_proposal(proposal.clone());
            info!(
                "proposal {} submitted on redaction {} by {} ({})",
                proposal.id,
                redaction_id,
                author.id,
                evidence_type.as_str()
            );

            if status == RedactionStatus::Unsolved {
                match state.compare_and_transition(
                    redaction_id,
                    RedactionStatus::Proposed,
                    &[RedactionStatus::Unsolved],
                ) {
                    Ok(()) => {}
                    // A concurrent first proposal already fired the
                    // transition; both proposals stand
                    Err(StoreError::StatusConflict { .. }) => {
                        debug!("redaction {} already proposed", redaction_id);
                    }
                    Err(other) => return Err(EngineError::Storage(other)),
                }
            }

            Ok(proposal)
        })
    }

    fn validate(
        &self,
        text: &str,
        evidence_description: &str,
        evidence_sources: &[String],
        supporting_chunk_ids: &[String],
    ) -> Result<(), EngineError> {
        let text_len = text.chars().count();
        if text_len < self.config.min_text_len || text_len > self.config.max_text_len {
            return Err(EngineError::Validation(format!(
                "proposed text must be {}-{} characters, got {}",
                self.config.min_text_len, self.config.max_text_len, text_len
            )));
        }

        let evidence_len = evidence_description.chars().count();
        if evidence_len < self.config.min_evidence_len || evidence_len > self.config.max_evidence_len {
            return Err(EngineError::Validation(format!(
                "evidence description must be {}-{} characters, got {}",
                self.config.min_evidence_len, self.config.max_evidence_len, evidence_len
            )));
        }

        if evidence_sources.len() > self.config.max_evidence_sources {
            return Err(EngineError::Validation(format!(
                "at most {} evidence sources allowed, got {}",
                self.config.max_evidence_sources,
                evidence_sources.len()
            )));
        }

        if supporting_chunk_ids.len() > self.config.max_supporting_chunks {
            return Err(EngineError::Validation(format!(
                "at most {} supporting chunks allowed, got {}",
                self.config.max_supporting_chunks,
                supporting_chunk_ids.len()
            )));
        }

        Ok(())
    }
}
