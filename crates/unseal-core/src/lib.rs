// UNSEAL CORE
// Data model and transactional store for the redaction-resolution consensus engine.

pub mod audit;
pub mod cascade;
pub mod error;
pub mod identity;
pub mod proposal;
pub mod redaction;
pub mod store;

pub use audit::{AuditAction, AuditEntry};
pub use cascade::{CascadeNode, CascadeRecord};
pub use error::StoreError;
pub use identity::{UserRef, UserTier};
pub use proposal::{EvidenceType, Proposal, Vote, VoteTally, VoteType};
pub use redaction::{Redaction, RedactionStatus, StatusTransition};
pub use store::{ConsensusStore, StoreState};
