// CONSENSUS ENGINE FACADE
// The surface the host application calls: proposals, votes, admin actions,
// cascade revert, and read accessors for the UI layer

use crate::cascade_propagator::{propagate, CascadeOutcome};
use crate::cascade_revert::{revert, RevertOutcome};
use crate::config::ConsensusConfig;
use crate::error::EngineError;
use crate::proposal_manager::ProposalManager;
use crate::vote_aggregator::{VoteAggregator, VoteOutcome};
use log::info;
use std::sync::Arc;
use unseal_core::{
    AuditAction, AuditEntry, CascadeRecord, ConsensusStore, EvidenceType, Proposal,
    RedactionStatus, UserRef, VoteType,
};

pub struct ConsensusEngine {
    store: Arc<ConsensusStore>,
    config: ConsensusConfig,
    proposals: ProposalManager,
    votes: VoteAggregator,
}

impl ConsensusEngine {
    pub fn new(store: Arc<ConsensusStore>, config: ConsensusConfig) -> Self {
        ConsensusEngine {
            proposals: ProposalManager::new(store.clone(), config.clone()),
            votes: VoteAggregator::new(store.clone(), config.clone()),
            store,
            config,
        }
    }

    /// Shared store handle, for seeding redactions at the ingestion boundary
    pub fn store(&self) -> Arc<ConsensusStore> {
        self.store.clone()
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Submit a candidate resolution for a redaction
    #[allow(clippy::too_many_arguments)]
    pub fn submit_proposal(
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
        self.proposals.submit(
            redaction_id,
            author,
            text,
            linked_entity_id,
            evidence_type,
            evidence_description,
            evidence_sources,
            supporting_chunk_ids,
        )
    }

    /// Cast (or replace) a vote on a proposal
    pub fn cast_vote(
        &self,
        redaction_id: &str,
        proposal_id: &str,
        voter: &UserRef,
        vote_type: VoteType,
    ) -> Result<VoteOutcome, EngineError> {
        self.votes.cast_vote(redaction_id, proposal_id, voter, vote_type)
    }

    /// All proposals for a redaction, highest composite confidence first
    pub fn proposals_for(&self, redaction_id: &str) -> Result<Vec<Proposal>, EngineError> {
        self.store.with_read(|state| {
            state.redaction(redaction_id).map_err(EngineError::from_store)?;

            let mut proposals: Vec<Proposal> = state
                .proposals_for_redaction(redaction_id)
                .into_iter()
                .cloned()
                .collect();
            proposals.sort_by(|a, b| {
                b.composite_confidence
                    .partial_cmp(&a.composite_confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });
            Ok(proposals)
        })
    }

    /// Explicit admin confirmation of a proposal; cascades like a threshold
    /// confirmation would
    pub fn admin_confirm(
        &self,
        redaction_id: &str,
        proposal_id: &str,
        admin: &UserRef,
    ) -> Result<CascadeOutcome, EngineError> {
        if !admin.is_admin() {
            return Err(EngineError::Forbidden(format!(
                "user {} is not an admin",
                admin.id
            )));
        }

        self.store.with_write(|state| {
            let proposal = state.proposal(proposal_id).map_err(EngineError::from_store)?;
            if proposal.redaction_id != redaction_id {
                return Err(EngineError::Validation(format!(
                    "proposal {} does not belong to redaction {}",
                    proposal_id, redaction_id
                )));
            }
            let proposed_text = proposal.proposed_text.clone();

            let redaction = state.redaction(redaction_id).map_err(EngineError::from_store)?;
            let prior = redaction.status;
            if !matches!(
                prior,
                RedactionStatus::Proposed | RedactionStatus::Corroborated
            ) {
                return Err(EngineError::Conflict(format!(
                    "redaction {} is {}; only proposed or corroborated redactions can be confirmed",
                    redaction_id, prior
                )));
            }

            state
                .confirm_with_text(redaction_id, &proposed_text, &[prior])
                .map_err(EngineError::from_store)?;
            let outcome = propagate(state, &self.config, redaction_id, &proposed_text, prior)?;

            let affected = state
                .cascade(redaction_id)
                .map(|record| record.affected_redaction_ids())
                .unwrap_or_else(|| vec![redaction_id.to_string()]);
            let entry = AuditEntry::new(
                AuditAction::AdminConfirmed,
                admin.id.clone(),
                format!("confirmed proposal {}", proposal_id),
                affected,
            )?;
            state.push_audit(entry);

            info!(
                "admin {} confirmed redaction {} via proposal {}",
                admin.id, redaction_id, proposal_id
            );
            Ok(outcome)
        })
    }

    /// Mark a redaction's evidence as false; closes voting without resolution
    pub fn admin_dispute(
        &self,
        redaction_id: &str,
        admin: &UserRef,
        reason: &str,
    ) -> Result<(), EngineError> {
        if !admin.is_admin() {
            return Err(EngineError::Forbidden(format!(
                "user {} is not an admin",
                admin.id
            )));
        }
        if reason.trim().is_empty() {
            return Err(EngineError::Validation(
                "dispute reason must not be empty".to_string(),
            ));
        }

        self.store.with_write(|state| {
            state
                .compare_and_transition(
                    redaction_id,
                    RedactionStatus::Disputed,
                    &[
                        RedactionStatus::Unsolved,
                        RedactionStatus::Proposed,
                        RedactionStatus::Corroborated,
                    ],
                )
                .map_err(EngineError::from_store)?;

            let entry = AuditEntry::new(
                AuditAction::AdminDisputed,
                admin.id.clone(),
                reason,
                vec![redaction_id.to_string()],
            )?;
            state.push_audit(entry);
            Ok(())
        })
    }

    /// Atomically undo a confirmation and its whole cascade tree
    pub fn revert_cascade(
        &self,
        root_redaction_id: &str,
        admin: &UserRef,
        reason: &str,
    ) -> Result<RevertOutcome, EngineError> {
        self.store
            .with_write(|state| revert(state, &self.config, root_redaction_id, admin, reason))
    }

    /// The recorded cascade tree for a confirmed root, if any
    pub fn cascade_record(&self, root_redaction_id: &str) -> Option<CascadeRecord> {
        self.store
            .with_read(|state| state.cascade(root_redaction_id).cloned())
    }

    /// The audit log, oldest first
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.store.with_read(|state| state.audit_log().to_vec())
    }
}
