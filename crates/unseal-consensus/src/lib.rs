// REDACTION RESOLUTION CONSENSUS ENGINE
// Crowd guesses converge on redacted text through weighted voting and evidence
// scoring; confirmed resolutions propagate across the corpus and can be
// atomically reverted.

pub mod cascade_propagator;
pub mod cascade_revert;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod error;
pub mod proposal_manager;
pub mod vote_aggregator;

pub use cascade_propagator::CascadeOutcome;
pub use cascade_revert::RevertOutcome;
pub use config::ConsensusConfig;
pub use engine::ConsensusEngine;
pub use error::EngineError;
pub use proposal_manager::ProposalManager;
pub use vote_aggregator::{VoteAggregator, VoteOutcome};

use std::sync::Arc;
use unseal_core::ConsensusStore;

/// Initialize an engine over a fresh in-memory store with default policy
pub fn init_engine() -> ConsensusEngine {
    ConsensusEngine::new(Arc::new(ConsensusStore::new()), ConsensusConfig::default())
}
