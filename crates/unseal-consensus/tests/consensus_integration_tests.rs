// CONSENSUS ENGINE INTEGRATION TESTS
// Full lifecycle scenarios driven through the engine facade
//
// Test Coverage:
// 1. Proposal submission and the first status transition
// 2. Vote replacement semantics and tally recounting
// 3. Self-vote rejection
// 4. Corroboration quorum driving the state machine
// 5. Evidence-type dominance in auto-confirmation
// 6. Cascade propagation across documents and its idempotence
// 7. Atomic revert restoring pre-cascade state, with audit trail
// 8. Proposal listing ordered by confidence

use std::sync::Arc;
use unseal_consensus::{ConsensusConfig, ConsensusEngine, EngineError};
use unseal_core::{
    ConsensusStore, EvidenceType, Redaction, RedactionStatus, UserRef, VoteType,
};

fn engine() -> ConsensusEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    ConsensusEngine::new(Arc::new(ConsensusStore::new()), ConsensusConfig::default())
}

fn seed(engine: &ConsensusEngine, redaction: Redaction) {
    engine.store().insert_redaction(redaction).unwrap();
}

fn evidence_note() -> &'static str {
    "name appears unredacted in the companion exhibit released alongside this filing"
}

#[test]
fn test_01_first_proposal_moves_redaction_to_proposed() {
    let engine = engine();
    seed(
        &engine,
        Redaction::new("r1", "doc1", 3, "accompanied on the flight by", Some(8)),
    );

    let proposal = engine
        .submit_proposal(
            "r1",
            &UserRef::member("alice"),
            "John Doe",
            None,
            EvidenceType::NewsReport,
            evidence_note(),
            vec![],
            vec![],
        )
        .unwrap();

    assert_eq!(proposal.length_match, Some(true));
    assert_eq!(
        engine.store().get_redaction("r1").unwrap().status,
        RedactionStatus::Proposed
    );
    println!("✓ First proposal transitioned unsolved -> proposed");
}

#[test]
fn test_02_repeat_votes_replace_never_accumulate() {
    let engine = engine();
    seed(
        &engine,
        Redaction::new("r1", "doc1", 3, "accompanied on the flight by", Some(8)),
    );
    let proposal = engine
        .submit_proposal(
            "r1",
            &UserRef::member("alice"),
            "John Doe",
            None,
            EvidenceType::Other,
            evidence_note(),
            vec![],
            vec![],
        )
        .unwrap();

    let bob = UserRef::member("bob");
    for _ in 0..3 {
        engine
            .cast_vote("r1", &proposal.id, &bob, VoteType::Upvote)
            .unwrap();
    }
    let outcome = engine
        .cast_vote("r1", &proposal.id, &bob, VoteType::Downvote)
        .unwrap();

    assert_eq!(outcome.tallies.upvotes, 0);
    assert_eq!(outcome.tallies.downvotes, 1);
    assert_eq!(outcome.tallies.corroborations, 0);
    println!("✓ Four sequential votes left exactly one row, final type wins");
}

#[test]
fn test_03_self_vote_rejected() {
    let engine = engine();
    seed(
        &engine,
        Redaction::new("r1", "doc1", 3, "accompanied on the flight by", Some(8)),
    );
    let alice = UserRef::member("alice");
    let proposal = engine
        .submit_proposal(
            "r1",
            &alice,
            "John Doe",
            None,
            EvidenceType::Other,
            evidence_note(),
            vec![],
            vec![],
        )
        .unwrap();

    let err = engine
        .cast_vote("r1", &proposal.id, &alice, VoteType::Upvote)
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    println!("✓ Self-vote rejected");
}

#[test]
fn test_04_corroboration_quorum_never_leaves_proposed() {
    let engine = engine();
    seed(
        &engine,
        Redaction::new("r1", "doc1", 3, "accompanied on the flight by", Some(20)),
    );
    // Weak evidence and a length mismatch keep confidence well under the
    // auto-confirm bar, isolating the quorum transition
    let proposal = engine
        .submit_proposal(
            "r1",
            &UserRef::member("alice"),
            "John Doe",
            None,
            EvidenceType::Other,
            evidence_note(),
            vec![],
            vec![],
        )
        .unwrap();

    for voter in ["bob", "carol", "dave"] {
        engine
            .cast_vote(
                "r1",
                &proposal.id,
                &UserRef::member(voter),
                VoteType::Corroborate,
            )
            .unwrap();
    }

    let refreshed = engine.store().get_proposal(&proposal.id).unwrap();
    assert_eq!(refreshed.corroborations, 3);
    assert_eq!(
        engine.store().get_redaction("r1").unwrap().status,
        RedactionStatus::Corroborated
    );
    println!("✓ Quorum of 3 corroborations moved redaction to corroborated");
}

#[test]
fn test_05_evidence_type_dominates_length_mismatch() {
    // charLengthEstimate 12 vs "John Doe" (8 chars): length_match = false.
    // official_release weight 1.0 still clears the 0.75 bar at the first
    // vote recomputation, despite the length penalty.
    let engine = engine();
    seed(
        &engine,
        Redaction::new("r1", "doc1", 3, "testified under oath alongside", Some(12)),
    );
    let proposal = engine
        .submit_proposal(
            "r1",
            &UserRef::member("alice"),
            "John Doe",
            None,
            EvidenceType::OfficialRelease,
            evidence_note(),
            vec![],
            vec![],
        )
        .unwrap();
    assert_eq!(proposal.length_match, Some(false));

    let outcome = engine
        .cast_vote(
            "r1",
            &proposal.id,
            &UserRef::member("bob"),
            VoteType::Corroborate,
        )
        .unwrap();

    assert!(outcome.auto_confirmed);
    assert_eq!(
        engine.store().get_redaction("r1").unwrap().status,
        RedactionStatus::Confirmed
    );
    println!("✓ Official-release evidence auto-confirmed despite length mismatch");
}

#[test]
fn test_06_confirmation_cascades_to_matching_redaction() {
    // R1 and R2 share charLengthEstimate ~ len("Epstein") and near-identical
    // surrounding text; confirming R1 resolves R2 at depth 1
    let engine = engine();
    seed(
        &engine,
        Redaction::new(
            "r1",
            "doc1",
            1,
            "flew from Teterboro to Palm Beach with",
            Some(9),
        ),
    );
    seed(
        &engine,
        Redaction::new(
            "r2",
            "doc2",
            8,
            "flew from TETERBORO to Palm-Beach with",
            Some(9),
        ),
    );

    let proposal = engine
        .submit_proposal(
            "r1",
            &UserRef::member("alice"),
            "J. Epstein",
            None,
            EvidenceType::CourtFiling,
            evidence_note(),
            vec![],
            vec![],
        )
        .unwrap();

    let outcome = engine
        .cast_vote(
            "r1",
            &proposal.id,
            &UserRef::member("bob"),
            VoteType::Corroborate,
        )
        .unwrap();

    assert!(outcome.auto_confirmed);
    assert_eq!(outcome.cascade_count, 1);

    let r2 = engine.store().get_redaction("r2").unwrap();
    assert_eq!(r2.status, RedactionStatus::Confirmed);
    assert_eq!(r2.resolved_text.as_deref(), Some("J. Epstein"));

    let record = engine.cascade_record("r1").unwrap();
    assert!(record.active);
    assert_eq!(record.cascade_count(), 1);
    assert_eq!(record.affected_document_ids(), vec!["doc1", "doc2"]);
    let node = record.nodes.iter().find(|n| n.redaction_id == "r2").unwrap();
    assert_eq!(node.depth, 1);
    assert_eq!(node.prior_status, RedactionStatus::Unsolved);
    println!("✓ Confirmation cascaded to the matching redaction");
}

#[test]
fn test_07_revert_restores_pre_cascade_state_and_is_idempotent() {
    let engine = engine();
    seed(
        &engine,
        Redaction::new(
            "r1",
            "doc1",
            1,
            "flew from Teterboro to Palm Beach with",
            Some(9),
        ),
    );
    seed(
        &engine,
        Redaction::new(
            "r2",
            "doc2",
            8,
            "flew from Teterboro to Palm Beach with",
            Some(9),
        ),
    );

    let proposal = engine
        .submit_proposal(
            "r1",
            &UserRef::member("alice"),
            "J. Epstein",
            None,
            EvidenceType::CourtFiling,
            evidence_note(),
            vec![],
            vec![],
        )
        .unwrap();
    engine
        .cast_vote(
            "r1",
            &proposal.id,
            &UserRef::member("bob"),
            VoteType::Corroborate,
        )
        .unwrap();
    assert_eq!(
        engine.store().get_redaction("r2").unwrap().status,
        RedactionStatus::Confirmed
    );

    let admin = UserRef::admin("adm");
    let outcome = engine
        .revert_cascade("r1", &admin, "cascade matched an unrelated passage")
        .unwrap();
    assert!(outcome.reverted);
    assert_eq!(outcome.affected_count, 2);

    // R1 back to its pre-confirmation status, R2 back to unsolved
    assert_eq!(
        engine.store().get_redaction("r1").unwrap().status,
        RedactionStatus::Proposed
    );
    assert_eq!(
        engine.store().get_redaction("r2").unwrap().status,
        RedactionStatus::Unsolved
    );
    assert!(!engine.cascade_record("r1").unwrap().active);

    let log = engine.audit_log();
    assert_eq!(log.len(), 1);
    assert!(log[0].verify_hash().unwrap());

    let second = engine
        .revert_cascade("r1", &admin, "cascade matched an unrelated passage")
        .unwrap();
    assert!(!second.reverted);
    assert_eq!(second.reason.as_deref(), Some("already reverted"));
    assert_eq!(engine.audit_log().len(), 1);
    println!("✓ Revert restored prior state; second revert was a no-op");
}

#[test]
fn test_08_revert_requires_admin_tier() {
    let engine = engine();
    seed(
        &engine,
        Redaction::new("r1", "doc1", 1, "hosted the dinner attended by", Some(9)),
    );
    let proposal = engine
        .submit_proposal(
            "r1",
            &UserRef::member("alice"),
            "J. Epstein",
            None,
            EvidenceType::CourtFiling,
            evidence_note(),
            vec![],
            vec![],
        )
        .unwrap();
    engine
        .cast_vote(
            "r1",
            &proposal.id,
            &UserRef::member("bob"),
            VoteType::Corroborate,
        )
        .unwrap();

    let err = engine
        .revert_cascade("r1", &UserRef::member("bob"), "i dislike this outcome")
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    println!("✓ Non-admin revert rejected");
}

#[test]
fn test_09_admin_confirm_and_dispute() {
    let engine = engine();
    seed(
        &engine,
        Redaction::new("r1", "doc1", 1, "hosted the dinner attended by", Some(9)),
    );
    seed(
        &engine,
        Redaction::new("r2", "doc2", 2, "boarded the helicopter alongside", Some(9)),
    );
    let admin = UserRef::admin("adm");

    let proposal = engine
        .submit_proposal(
            "r1",
            &UserRef::member("alice"),
            "J. Epstein",
            None,
            EvidenceType::ContextualInference,
            evidence_note(),
            vec![],
            vec![],
        )
        .unwrap();

    let err = engine
        .admin_confirm("r1", &proposal.id, &UserRef::member("mallory"))
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let outcome = engine.admin_confirm("r1", &proposal.id, &admin).unwrap();
    assert_eq!(outcome.root_redaction_id, "r1");
    assert_eq!(
        engine.store().get_redaction("r1").unwrap().status,
        RedactionStatus::Confirmed
    );

    engine
        .admin_dispute("r2", &admin, "fabricated source document")
        .unwrap();
    assert_eq!(
        engine.store().get_redaction("r2").unwrap().status,
        RedactionStatus::Disputed
    );

    // Both interventions audited
    assert_eq!(engine.audit_log().len(), 2);
    println!("✓ Admin confirm and dispute both applied and audited");
}

#[test]
fn test_10_proposals_listed_by_confidence() {
    let engine = engine();
    seed(
        &engine,
        Redaction::new("r1", "doc1", 1, "hosted the dinner attended by", Some(20)),
    );

    // Length mismatch everywhere keeps all three under the auto-confirm bar
    for (author, text, evidence) in [
        ("alice", "John Doe", EvidenceType::Other),
        ("bob", "Jane Roe", EvidenceType::CourtFiling),
        ("carol", "Jim Poe", EvidenceType::NewsReport),
    ] {
        engine
            .submit_proposal(
                "r1",
                &UserRef::member(author),
                text,
                None,
                evidence,
                evidence_note(),
                vec![],
                vec![],
            )
            .unwrap();
    }

    let listed = engine.proposals_for("r1").unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].author, "bob");
    assert_eq!(listed[1].author, "carol");
    assert_eq!(listed[2].author, "alice");
    assert!(listed[0].composite_confidence >= listed[1].composite_confidence);
    println!("✓ Proposals ordered by composite confidence descending");
}

#[test]
fn test_11_voting_and_proposing_closed_after_dispute() {
    let engine = engine();
    seed(
        &engine,
        Redaction::new("r1", "doc1", 1, "hosted the dinner attended by", Some(9)),
    );
    let proposal = engine
        .submit_proposal(
            "r1",
            &UserRef::member("alice"),
            "J. Epstein",
            None,
            EvidenceType::Other,
            evidence_note(),
            vec![],
            vec![],
        )
        .unwrap();

    engine
        .admin_dispute("r1", &UserRef::admin("adm"), "fabricated source document")
        .unwrap();

    let err = engine
        .cast_vote("r1", &proposal.id, &UserRef::member("bob"), VoteType::Upvote)
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let err = engine
        .submit_proposal(
            "r1",
            &UserRef::member("bob"),
            "Someone Else",
            None,
            EvidenceType::Other,
            evidence_note(),
            vec![],
            vec![],
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    println!("✓ Disputed redaction accepts neither votes nor proposals");
}
