// CONSENSUS STORE
// Serializable transactional store for redactions, proposals, votes, and cascades
//
// SAFETY INVARIANTS:
// 1. One write lock guards the whole state block; every mutating operation is
//    a serializable read-modify-write under that lock
// 2. compare_and_transition is the sole mutator of redaction status and fails
//    (never silently no-ops) when the current status is outside the allowed set
// 3. Tallies are recomputed by counting vote rows, never incremented in place
// 4. Only the cascade paths mutate many redactions in one unit of work
// 5. Correctness holds under arbitrary interleaving of concurrent callers

use crate::audit::AuditEntry;
use crate::cascade::CascadeRecord;
use crate::error::StoreError;
use crate::proposal::{Proposal, Vote, VoteTally, VoteType};
use crate::redaction::{Redaction, RedactionStatus};
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// All tables, guarded together so multi-row operations commit atomically
#[derive(Debug, Default)]
pub struct StoreState {
    redactions: BTreeMap<String, Redaction>,
    proposals: BTreeMap<String, Proposal>,
    /// Keyed (proposal_id, voter); upsert gives last-vote-wins per voter
    votes: BTreeMap<(String, String), Vote>,
    /// Keyed by root redaction id
    cascades: BTreeMap<String, CascadeRecord>,
    /// Redaction id -> root id of the active cascade containing it
    active_cascade_members: BTreeMap<String, String>,
    audit_log: Vec<AuditEntry>,
}

impl StoreState {
    // ---- redactions ----

    pub fn insert_redaction(&mut self, redaction: Redaction) -> Result<(), StoreError> {
        if self.redactions.contains_key(&redaction.id) {
            return Err(StoreError::DuplicateRedaction(redaction.id));
        }
        self.redactions.insert(redaction.id.clone(), redaction);
        Ok(())
    }

    pub fn redaction(&self, id: &str) -> Result<&Redaction, StoreError> {
        self.redactions
            .get(id)
            .ok_or_else(|| StoreError::RedactionNotFound(id.to_string()))
    }

    pub fn redactions(&self) -> impl Iterator<Item = &Redaction> {
        self.redactions.values()
    }

    /// Guarded status mutation. The current status must be in `allowed_from`
    /// and the (current, new) pair must be in the legal transition table;
    /// the check and the write happen under the same lock acquisition.
    pub fn compare_and_transition(
        &mut self,
        id: &str,
        new_status: RedactionStatus,
        allowed_from: &[RedactionStatus],
    ) -> Result<(), StoreError> {
        let redaction = self
            .redactions
            .get_mut(id)
            .ok_or_else(|| StoreError::RedactionNotFound(id.to_string()))?;

        let current = redaction.status;
        if !allowed_from.contains(&current) {
            return Err(StoreError::StatusConflict {
                id: id.to_string(),
                current,
            });
        }
        if !RedactionStatus::can_transition(current, new_status) {
            return Err(StoreError::IllegalTransition {
                from: current,
                to: new_status,
            });
        }

        redaction.record_transition(new_status);
        info!("redaction {} transitioned {} -> {}", id, current, new_status);
        Ok(())
    }

    /// Confirm a redaction and attach its resolved text in one step
    pub fn confirm_with_text(
        &mut self,
        id: &str,
        text: &str,
        allowed_from: &[RedactionStatus],
    ) -> Result<(), StoreError> {
        self.compare_and_transition(id, RedactionStatus::Confirmed, allowed_from)?;
        if let Some(redaction) = self.redactions.get_mut(id) {
            redaction.resolved_text = Some(text.to_string());
        }
        Ok(())
    }

    /// Revert path only: restore a confirmed redaction to a snapshotted prior
    /// status, bypassing the forward transition table. The restore is still
    /// history-recorded.
    pub fn restore_status(&mut self, id: &str, prior: RedactionStatus) -> Result<(), StoreError> {
        let redaction = self
            .redactions
            .get_mut(id)
            .ok_or_else(|| StoreError::RedactionNotFound(id.to_string()))?;

        let current = redaction.status;
        if current != RedactionStatus::Confirmed {
            return Err(StoreError::StatusConflict {
                id: id.to_string(),
                current,
            });
        }

        redaction.record_transition(prior);
        redaction.resolved_text = None;
        info!("redaction {} restored {} -> {}", id, current, prior);
        Ok(())
    }

    // ---- proposals ----

    pub fn insert_proposal(&mut self, proposal: Proposal) {
        self.proposals.insert(proposal.id.clone(), proposal);
    }

    pub fn proposal(&self, id: &str) -> Result<&Proposal, StoreError> {
        self.proposals
            .get(id)
            .ok_or_else(|| StoreError::ProposalNotFound(id.to_string()))
    }

    pub fn proposal_mut(&mut self, id: &str) -> Result<&mut Proposal, StoreError> {
        self.proposals
            .get_mut(id)
            .ok_or_else(|| StoreError::ProposalNotFound(id.to_string()))
    }

    pub fn proposals_for_redaction(&self, redaction_id: &str) -> Vec<&Proposal> {
        self.proposals
            .values()
            .filter(|p| p.redaction_id == redaction_id)
            .collect()
    }

    // ---- votes ----

    /// Insert or replace the (proposal, voter) vote row
    pub fn upsert_vote(&mut self, vote: Vote) {
        let key = (vote.proposal_id.clone(), vote.voter.clone());
        if let Some(prior) = self.votes.insert(key, vote) {
            debug!(
                "vote replaced for ({}, {}): was {}",
                prior.proposal_id,
                prior.voter,
                prior.vote_type.as_str()
            );
        }
    }

    /// Recount the tally from the authoritative vote rows
    pub fn count_votes(&self, proposal_id: &str) -> VoteTally {
        let mut tally = VoteTally::default();
        for vote in self
            .votes
            .values()
            .filter(|v| v.proposal_id == proposal_id)
        {
            match vote.vote_type {
                VoteType::Upvote => tally.upvotes += 1,
                VoteType::Downvote => tally.downvotes += 1,
                VoteType::Corroborate => tally.corroborations += 1,
            }
        }
        tally
    }

    pub fn vote(&self, proposal_id: &str, voter: &str) -> Option<&Vote> {
        self.votes
            .get(&(proposal_id.to_string(), voter.to_string()))
    }

    // ---- cascades ----

    pub fn insert_cascade(&mut self, record: CascadeRecord) {
        for node in &record.nodes {
            self.active_cascade_members
                .insert(node.redaction_id.clone(), record.root_redaction_id.clone());
        }
        self.cascades
            .insert(record.root_redaction_id.clone(), record);
    }

    pub fn cascade(&self, root_redaction_id: &str) -> Option<&CascadeRecord> {
        self.cascades.get(root_redaction_id)
    }

    pub fn in_active_cascade(&self, redaction_id: &str) -> bool {
        self.active_cascade_members.contains_key(redaction_id)
    }

    /// Tombstone a cascade record and release its members
    pub fn deactivate_cascade(&mut self, root_redaction_id: &str) {
        if let Some(record) = self.cascades.get_mut(root_redaction_id) {
            record.active = false;
            for node in &record.nodes {
                self.active_cascade_members.remove(&node.redaction_id);
            }
        }
    }

    // ---- audit ----

    pub fn push_audit(&mut self, entry: AuditEntry) {
        self.audit_log.push(entry);
    }

    pub fn audit_log(&self) -> &[AuditEntry] {
        &self.audit_log
    }
}

/// Shared transactional store. Readers may observe concurrently; writers are
/// serialized through the write lock.
#[derive(Debug, Default)]
pub struct ConsensusStore {
    state: RwLock<StoreState>,
}

impl ConsensusStore {
    pub fn new() -> Self {
        ConsensusStore {
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Seed a redaction slot (ingestion boundary)
    pub fn insert_redaction(&self, redaction: Redaction) -> Result<(), StoreError> {
        self.state.write().insert_redaction(redaction)
    }

    pub fn get_redaction(&self, id: &str) -> Result<Redaction, StoreError> {
        self.state.read().redaction(id).cloned()
    }

    pub fn get_proposal(&self, id: &str) -> Result<Proposal, StoreError> {
        self.state.read().proposal(id).cloned()
    }

    /// Guarded status mutation as a standalone transaction
    pub fn compare_and_transition(
        &self,
        id: &str,
        new_status: RedactionStatus,
        allowed_from: &[RedactionStatus],
    ) -> Result<(), StoreError> {
        self.state
            .write()
            .compare_and_transition(id, new_status, allowed_from)
    }

    /// Run a read-only closure against a consistent snapshot of the state
    pub fn with_read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.state.read())
    }

    /// Run a closure as one serializable read-modify-write transaction.
    /// Callers validate before the first mutation so a failed operation
    /// leaves the state untouched.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        f(&mut self.state.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::EvidenceType;
    use proptest::prelude::*;

    fn store_with_redaction(id: &str) -> ConsensusStore {
        let store = ConsensusStore::new();
        store
            .insert_redaction(Redaction::new(id, "doc1", 1, "context", Some(8)))
            .unwrap();
        store
    }

    fn test_proposal(redaction_id: &str, author: &str) -> Proposal {
        Proposal::new(
            redaction_id,
            author,
            "Ghislaine",
            None,
            EvidenceType::NewsReport,
            "matches the 2015 reporting",
            vec![],
            vec![],
            Some(true),
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_redaction_rejected() {
        let store = store_with_redaction("r1");
        let result = store.insert_redaction(Redaction::new("r1", "doc2", 2, "other", None));
        assert!(matches!(result, Err(StoreError::DuplicateRedaction(_))));
    }

    #[test]
    fn test_get_missing_redaction() {
        let store = ConsensusStore::new();
        assert!(matches!(
            store.get_redaction("nope"),
            Err(StoreError::RedactionNotFound(_))
        ));
    }

    #[test]
    fn test_compare_and_transition_guard() {
        let store = store_with_redaction("r1");

        store
            .compare_and_transition("r1", RedactionStatus::Proposed, &[RedactionStatus::Unsolved])
            .unwrap();

        // Second attempt from the same prior state must conflict, not no-op
        let second = store.compare_and_transition(
            "r1",
            RedactionStatus::Proposed,
            &[RedactionStatus::Unsolved],
        );
        assert!(matches!(second, Err(StoreError::StatusConflict { .. })));

        let redaction = store.get_redaction("r1").unwrap();
        assert_eq!(redaction.status, RedactionStatus::Proposed);
        assert_eq!(redaction.status_history.len(), 1);
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let store = store_with_redaction("r1");
        let result = store.compare_and_transition(
            "r1",
            RedactionStatus::Confirmed,
            &[RedactionStatus::Unsolved],
        );
        assert!(matches!(result, Err(StoreError::IllegalTransition { .. })));
    }

    #[test]
    fn test_restore_requires_confirmed() {
        let store = store_with_redaction("r1");
        let result = store.with_write(|state| state.restore_status("r1", RedactionStatus::Unsolved));
        assert!(matches!(result, Err(StoreError::StatusConflict { .. })));
    }

    #[test]
    fn test_confirm_with_text_sets_resolution() {
        let store = store_with_redaction("r1");
        store
            .compare_and_transition("r1", RedactionStatus::Proposed, &[RedactionStatus::Unsolved])
            .unwrap();
        store
            .with_write(|state| {
                state.confirm_with_text("r1", "Epstein", &[RedactionStatus::Proposed])
            })
            .unwrap();

        let redaction = store.get_redaction("r1").unwrap();
        assert_eq!(redaction.status, RedactionStatus::Confirmed);
        assert_eq!(redaction.resolved_text.as_deref(), Some("Epstein"));
    }

    #[test]
    fn test_vote_upsert_replaces() {
        let store = store_with_redaction("r1");
        let proposal = test_proposal("r1", "alice");
        let pid = proposal.id.clone();
        store.with_write(|state| state.insert_proposal(proposal));

        store.with_write(|state| {
            state.upsert_vote(Vote::new(pid.clone(), "bob", VoteType::Upvote));
            state.upsert_vote(Vote::new(pid.clone(), "bob", VoteType::Corroborate));
        });

        let tally = store.with_read(|state| state.count_votes(&pid));
        assert_eq!(tally.upvotes, 0);
        assert_eq!(tally.corroborations, 1);

        let current = store.with_read(|state| state.vote(&pid, "bob").map(|v| v.vote_type));
        assert_eq!(current, Some(VoteType::Corroborate));
    }

    #[test]
    fn test_count_votes_from_rows() {
        let store = store_with_redaction("r1");
        let proposal = test_proposal("r1", "alice");
        let pid = proposal.id.clone();
        store.with_write(|state| state.insert_proposal(proposal));

        store.with_write(|state| {
            state.upsert_vote(Vote::new(pid.clone(), "bob", VoteType::Upvote));
            state.upsert_vote(Vote::new(pid.clone(), "carol", VoteType::Corroborate));
            state.upsert_vote(Vote::new(pid.clone(), "dave", VoteType::Downvote));
            state.upsert_vote(Vote::new(pid.clone(), "erin", VoteType::Corroborate));
        });

        let tally = store.with_read(|state| state.count_votes(&pid));
        assert_eq!(
            tally,
            VoteTally {
                upvotes: 1,
                downvotes: 1,
                corroborations: 2,
            }
        );
    }

    proptest! {
        // N sequential votes from one voter leave exactly one row, and the
        // tally reflects only the final vote type
        #[test]
        fn prop_vote_replacement_idempotent(types in proptest::collection::vec(0u8..3, 1..12)) {
            let store = store_with_redaction("r1");
            let proposal = test_proposal("r1", "alice");
            let pid = proposal.id.clone();
            store.with_write(|state| state.insert_proposal(proposal));

            let as_type = |t: u8| match t {
                0 => VoteType::Upvote,
                1 => VoteType::Downvote,
                _ => VoteType::Corroborate,
            };

            for &t in &types {
                store.with_write(|state| {
                    state.upsert_vote(Vote::new(pid.clone(), "bob", as_type(t)));
                });
            }

            let tally = store.with_read(|state| state.count_votes(&pid));
            let total = tally.upvotes + tally.downvotes + tally.corroborations;
            prop_assert_eq!(total, 1);

            let last = as_type(*types.last().unwrap());
            let expected = match last {
                VoteType::Upvote => tally.upvotes,
                VoteType::Downvote => tally.downvotes,
                VoteType::Corroborate => tally.corroborations,
            };
            prop_assert_eq!(expected, 1);
        }
    }
}
