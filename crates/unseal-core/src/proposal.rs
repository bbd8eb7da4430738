// PROPOSALS AND VOTES
// User-submitted candidate resolutions with evidence, and per-user reactions
//
// SAFETY INVARIANTS:
// 1. proposed_text is immutable after creation (id commits to it)
// 2. Votes are keyed (proposal, voter); a repeat vote replaces the prior one
// 3. Tally counters are denormalized caches, recomputed from vote rows only
// 4. A user never votes on their own proposal

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Evidence category, ordered by probative weight. Sworn and official
/// sources outweigh crowd inference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EvidenceType {
    /// Unredacted copy in an official release
    OfficialRelease,

    /// Named in a court filing
    CourtFiling,

    /// Sworn deposition or testimony
    SwornTestimony,

    /// Published news reporting
    NewsReport,

    /// Cross-reference to another document in the corpus
    CrossReference,

    /// Inference from surrounding context
    ContextualInference,

    /// Anything else
    Other,
}

impl EvidenceType {
    /// Probative weight contributed to the composite confidence score
    pub fn weight(&self) -> f64 {
        match self {
            EvidenceType::OfficialRelease => 1.0,
            EvidenceType::CourtFiling => 0.9,
            EvidenceType::SwornTestimony => 0.85,
            EvidenceType::NewsReport => 0.6,
            EvidenceType::CrossReference => 0.5,
            EvidenceType::ContextualInference => 0.35,
            EvidenceType::Other => 0.2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceType::OfficialRelease => "official_release",
            EvidenceType::CourtFiling => "court_filing",
            EvidenceType::SwornTestimony => "sworn_testimony",
            EvidenceType::NewsReport => "news_report",
            EvidenceType::CrossReference => "cross_reference",
            EvidenceType::ContextualInference => "contextual_inference",
            EvidenceType::Other => "other",
        }
    }
}

/// Reaction to a proposal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VoteType {
    /// Simple approval
    Upvote,

    /// Simple disapproval
    Downvote,

    /// Independent confirmation of correctness, stronger than approval
    Corroborate,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Upvote => "upvote",
            VoteType::Downvote => "downvote",
            VoteType::Corroborate => "corroborate",
        }
    }
}

/// One user's current vote on one proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// Proposal being voted on
    pub proposal_id: String,

    /// Voter identity
    pub voter: String,

    /// Current vote type (last vote wins)
    pub vote_type: VoteType,

    /// When the vote was cast or last replaced
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(proposal_id: impl Into<String>, voter: impl Into<String>, vote_type: VoteType) -> Self {
        Vote {
            proposal_id: proposal_id.into(),
            voter: voter.into(),
            vote_type,
            cast_at: Utc::now(),
        }
    }
}

/// Recomputed vote counts for one proposal
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteTally {
    pub upvotes: u32,
    pub downvotes: u32,
    pub corroborations: u32,
}

/// One user's candidate resolution for one redaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Unique proposal ID (hex content hash)
    pub id: String,

    /// Redaction this proposal targets
    pub redaction_id: String,

    /// Author identity
    pub author: String,

    /// The guessed hidden text (immutable after creation)
    pub proposed_text: String,

    /// Optional link to a known entity
    pub linked_entity_id: Option<String>,

    /// Evidence category
    pub evidence_type: EvidenceType,

    /// Free-text description of the evidence
    pub evidence_description: String,

    /// Source references backing the evidence
    pub evidence_sources: Vec<String>,

    /// Corroborating passage references elsewhere in the corpus
    pub supporting_chunk_ids: Vec<String>,

    /// Whether the guess length fits the pixel-width estimate; None when the
    /// redaction has no known estimate
    pub length_match: Option<bool>,

    /// Denormalized upvote count
    pub upvotes: u32,

    /// Denormalized downvote count
    pub downvotes: u32,

    /// Denormalized corroboration count
    pub corroborations: u32,

    /// Composite confidence score in [0, 1]
    pub composite_confidence: f64,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Proposal {
    /// Create a proposal with all counters at zero. The ID commits to the
    /// identifying content, so competing guesses from the same author get
    /// distinct IDs.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        redaction_id: impl Into<String>,
        author: impl Into<String>,
        proposed_text: impl Into<String>,
        linked_entity_id: Option<String>,
        evidence_type: EvidenceType,
        evidence_description: impl Into<String>,
        evidence_sources: Vec<String>,
        supporting_chunk_ids: Vec<String>,
        length_match: Option<bool>,
    ) -> Result<Self, StoreError> {
        let redaction_id = redaction_id.into();
        let author = author.into();
        let proposed_text = proposed_text.into();
        let created_at = Utc::now();
        let id = Self::compute_id(&redaction_id, &author, &proposed_text, created_at)?;

        Ok(Proposal {
            id,
            redaction_id,
            author,
            proposed_text,
            linked_entity_id,
            evidence_type,
            evidence_description: evidence_description.into(),
            evidence_sources,
            supporting_chunk_ids,
            length_match,
            upvotes: 0,
            downvotes: 0,
            corroborations: 0,
            composite_confidence: 0.0,
            created_at,
        })
    }

    /// Compute the content-hash ID
    fn compute_id(
        redaction_id: &str,
        author: &str,
        proposed_text: &str,
        created_at: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let serialized = bincode::serialize(&(
            redaction_id,
            author,
            proposed_text,
            created_at.timestamp_nanos_opt().unwrap_or_default(),
        ))
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&serialized);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Current denormalized tally
    pub fn tally(&self) -> VoteTally {
        VoteTally {
            upvotes: self.upvotes,
            downvotes: self.downvotes,
            corroborations: self.corroborations,
        }
    }

    /// Overwrite the denormalized counters from a fresh recount
    pub fn apply_tally(&mut self, tally: VoteTally) {
        self.upvotes = tally.upvotes;
        self.downvotes = tally.downvotes;
        self.corroborations = tally.corroborations;
    }
}
