mod common;

use chrono::Duration;
use common::*;
use crowdsignal::domain::error::DomainError;
use crowdsignal::domain::events::DomainEvent;
use crowdsignal::domain::values::vetting_status::VettingStatus;
use crowdsignal::domain::entities::user_reputation::UserReputation;
use crowdsignal::domain::values::vote_direction::VoteDirection;
use crowdsignal::Stores;
use futures_util::StreamExt;
use std::sync::Arc;

#[tokio::test]
async fn test_submit_opens_pending_item() {
    let h = setup();
    let rec = submit(&h, "alice").await;

    assert_eq!(rec.status, VettingStatus::Pending);
    assert_eq!(rec.created_at, day0());
    assert_eq!(rec.expires_at, day0() + Duration::days(7));
    assert_eq!(rec.submitter_reputation, 0.0);
    assert_eq!(rec.total_voters, 0);

    // ledger entry is created lazily on first submission
    let rep = h.cs.reputation("alice").await.unwrap().unwrap();
    assert_eq!(rep.counters.total_recommendations, 0);
}

#[tokio::test]
async fn test_submit_snapshots_reputation() {
    let h = setup();
    for _ in 0..4 {
        h.cs.record_recommendation_outcome("carol", true).await.unwrap();
    }
    let rec = submit(&h, "carol").await;
    // 5*4 + 20*1.0
    assert_eq!(rec.submitter_reputation, 40.0);

    // later reputation changes do not touch the snapshot
    h.cs.record_recommendation_outcome("carol", true).await.unwrap();
    let reloaded = h.cs.recommendation(&rec.id).await.unwrap();
    assert_eq!(reloaded.submitter_reputation, 40.0);
}

#[tokio::test]
async fn test_submit_rejects_invalid_content() {
    let h = setup();
    let mut content = buy_content();
    content.reasoning = "".into();
    let err = h
        .cs
        .submit("alice".into(), "Alice".into(), content)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
    assert!(h.cs.queue(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_seven_up_three_down_approves_and_creates_signal() {
    let mut h = setup();
    let rec = submit(&h, "alice").await;
    h.drain_events();

    vote_many(&h, &rec.id, 7, 2).await;
    let receipt = h
        .cs
        .apply_vote(&rec.id, "down-last", VoteDirection::Down, 0.0, None)
        .await
        .unwrap();

    assert_eq!(receipt.resolution, Some(VettingStatus::Approved));
    assert_eq!(receipt.recommendation.weighted_score, 4.0);
    assert_eq!(receipt.recommendation.total_voters, 10);
    let signal = receipt.signal.expect("approval creates a signal");
    assert_eq!(signal.recommendation_id, rec.id);

    let stored = h.cs.recommendation(&rec.id).await.unwrap();
    assert_eq!(stored.status, VettingStatus::Approved);
    assert_eq!(stored.signal_id.as_deref(), Some(signal.id.as_str()));

    let rep = h.cs.reputation("alice").await.unwrap().unwrap();
    assert_eq!(rep.counters.total_recommendations, 1);
    assert_eq!(rep.counters.approved, 1);
    assert_eq!(rep.counters.total_votes_received, 10);
    assert_eq!(rep.counters.helpful_votes, 7);

    let events = h.drain_events();
    assert!(events.contains(&DomainEvent::RecommendationResolved {
        id: rec.id.clone(),
        outcome: VettingStatus::Approved,
    }));
    assert!(events.contains(&DomainEvent::SignalCreated {
        id: signal.id.clone(),
        source_recommendation_id: rec.id.clone(),
    }));
}

#[tokio::test]
async fn test_one_up_four_down_rejects() {
    let mut h = setup();
    let rec = submit(&h, "bob").await;
    vote_many(&h, &rec.id, 1, 4).await;

    let stored = h.cs.recommendation(&rec.id).await.unwrap();
    assert_eq!(stored.status, VettingStatus::Rejected);
    assert_eq!(stored.signal_id, None);
    assert!(h.cs.signal_for(&rec.id).await.unwrap().is_none());

    let rep = h.cs.reputation("bob").await.unwrap().unwrap();
    assert_eq!(rep.counters.rejected, 1);
    assert_eq!(rep.counters.approved, 0);

    let events = h.drain_events();
    assert!(events.contains(&DomainEvent::RecommendationResolved {
        id: rec.id.clone(),
        outcome: VettingStatus::Rejected,
    }));
    assert!(!events.iter().any(|e| e.kind() == "signal_created"));
}

#[tokio::test]
async fn test_nine_voters_remain_open() {
    let h = setup();
    let rec = submit(&h, "alice").await;
    vote_many(&h, &rec.id, 7, 2).await;

    let stored = h.cs.recommendation(&rec.id).await.unwrap();
    assert_eq!(stored.status, VettingStatus::Voting);
    assert!(stored.approval_rate() > 0.77);
    assert!(h.cs.active_signals(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_vote_rejected_without_side_effects() {
    let h = setup();
    let rec = submit(&h, "alice").await;
    h.cs
        .apply_vote(&rec.id, "voter", VoteDirection::Up, 0.0, None)
        .await
        .unwrap();
    let before = h.cs.recommendation(&rec.id).await.unwrap();

    let err = h
        .cs
        .apply_vote(&rec.id, "voter", VoteDirection::Down, 0.0, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateVote { .. }));

    let after = h.cs.recommendation(&rec.id).await.unwrap();
    assert_eq!(before, after);
    let rep = h.cs.reputation("alice").await.unwrap().unwrap();
    assert_eq!(rep.counters.total_votes_received, 1);
}

#[tokio::test]
async fn test_vote_on_resolved_item_not_votable() {
    let h = setup();
    let rec = submit(&h, "bob").await;
    vote_many(&h, &rec.id, 1, 4).await;

    let err = h
        .cs
        .apply_vote(&rec.id, "latecomer", VoteDirection::Up, 0.0, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotVotable(_)));
}

#[tokio::test]
async fn test_vote_on_unknown_item_not_found() {
    let h = setup();
    let err = h
        .cs
        .apply_vote("missing", "voter", VoteDirection::Up, 0.0, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn test_cast_vote_uses_ledger_score() {
    let h = setup();
    // 20 of 20 approved → score 120 → weight 3
    for _ in 0..20 {
        h.cs.record_recommendation_outcome("veteran", true).await.unwrap();
    }
    let rec = submit(&h, "alice").await;
    let receipt = h
        .cs
        .cast_vote(&rec.id, "veteran", VoteDirection::Up, Some("solid thesis".into()))
        .await
        .unwrap();

    let voter = &receipt.recommendation.voters[0];
    assert_eq!(voter.voter_reputation, 120.0);
    assert_eq!(voter.weight.value(), 3.0);
    assert_eq!(voter.comment.as_deref(), Some("solid thesis"));
    assert_eq!(receipt.recommendation.weighted_score, 3.0);

    // unknown voters vote at weight 1
    let receipt = h
        .cs
        .cast_vote(&rec.id, "newcomer", VoteDirection::Down, None)
        .await
        .unwrap();
    assert_eq!(receipt.recommendation.weighted_score, 2.0);
}

#[tokio::test]
async fn test_weighted_score_matches_voter_records() {
    let h = setup();
    let rec = submit(&h, "alice").await;
    let votes = [
        ("a", VoteDirection::Up, 120.0),
        ("b", VoteDirection::Down, 60.0),
        ("c", VoteDirection::Up, 25.0),
        ("d", VoteDirection::Up, 5.0),
    ];
    for (voter, dir, rep) in votes {
        h.cs.apply_vote(&rec.id, voter, dir, rep, None).await.unwrap();
    }
    let stored = h.cs.recommendation(&rec.id).await.unwrap();
    assert_eq!(stored.weighted_score, 3.0 - 2.0 + 1.5 + 1.0);
    assert_eq!(stored.weighted_score, stored.recomputed_weighted_score());
    assert_eq!(stored.total_voters, stored.upvotes + stored.downvotes);
}

#[tokio::test]
async fn test_queue_and_pending_views() {
    let h = setup();
    let first = submit(&h, "alice").await;
    h.clock.advance(Duration::minutes(5));
    let second = submit(&h, "bob").await;
    h.clock.advance(Duration::minutes(5));
    let third = submit(&h, "carol").await;

    h.cs
        .apply_vote(&second.id, "v", VoteDirection::Up, 0.0, None)
        .await
        .unwrap();
    vote_many(&h, &third.id, 1, 4).await;

    let queue: Vec<String> = h.cs.queue(None).await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(queue, vec![first.id.clone(), second.id.clone()]);

    let pending = h.cs.pending(None).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, first.id);

    let history = h.cs.recommendations_by("carol", None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, VettingStatus::Rejected);
}

#[tokio::test]
async fn test_watch_queue_streams_snapshots() {
    let h = setup();
    submit(&h, "alice").await;

    let mut stream = h.cs.watch_queue(None);
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 1);

    submit(&h, "bob").await;
    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(second.len(), 2);

    // a restarted stream begins at the current state
    let mut restarted = h.cs.watch_queue(Some(1));
    let snap = restarted.next().await.unwrap().unwrap();
    assert_eq!(snap.len(), 1);
}

#[tokio::test]
async fn test_committed_vote_survives_reputation_outage() {
    let reputations = Arc::new(FailingStore::<UserReputation>::new());
    let mut stores = Stores::memory();
    stores.reputations = reputations.clone();
    let h = setup_with(stores);

    let rec = submit(&h, "alice").await;
    vote_many(&h, &rec.id, 9, 0).await;

    reputations.set_failing(true);
    let receipt = h
        .cs
        .apply_vote(&rec.id, "closer", VoteDirection::Up, 0.0, None)
        .await
        .unwrap();
    assert_eq!(receipt.resolution, Some(VettingStatus::Approved));
    let signal = receipt.signal.expect("signal still created");

    let stored = h.cs.recommendation(&rec.id).await.unwrap();
    assert_eq!(stored.status, VettingStatus::Approved);
    assert_eq!(stored.signal_id.as_deref(), Some(signal.id.as_str()));
    assert!(stored.settled_at.is_none());

    // the submitter could not be credited yet
    let before = h.cs.reputation("alice").await.unwrap().unwrap();
    assert_eq!(before.counters.total_recommendations, 0);
    assert_eq!(before.counters.total_votes_received, 9);

    // still down: the sweep leaves the work outstanding
    let report = h.cs.sweep().await.unwrap();
    assert!(report.settled_recommendations.is_empty());

    reputations.set_failing(false);
    let report = h.cs.sweep().await.unwrap();
    assert_eq!(report.settled_recommendations, vec![rec.id.clone()]);

    let rep = h.cs.reputation("alice").await.unwrap().unwrap();
    assert_eq!(rep.counters.total_recommendations, 1);
    assert_eq!(rep.counters.approved, 1);
    assert_eq!(rep.counters.total_votes_received, 10);
    assert_eq!(rep.counters.helpful_votes, 10);
    assert!(h.cs.recommendation(&rec.id).await.unwrap().settled_at.is_some());

    // settling again credits nothing twice
    let report = h.cs.sweep().await.unwrap();
    assert!(report.settled_recommendations.is_empty());
    let again = h.cs.reputation("alice").await.unwrap().unwrap();
    assert_eq!(again.counters, rep.counters);
    assert_eq!(h.cs.active_signals(None).await.unwrap().len(), 1);
    assert_eq!(h.cs.signal_for(&rec.id).await.unwrap().unwrap().id, signal.id);
}

#[tokio::test]
async fn test_resolution_settles_immediately_when_healthy() {
    let h = setup();
    let rec = submit(&h, "alice").await;
    vote_many(&h, &rec.id, 1, 4).await;

    let stored = h.cs.recommendation(&rec.id).await.unwrap();
    assert_eq!(stored.status, VettingStatus::Rejected);
    assert!(stored.settled_at.is_some());

    let report = h.cs.sweep().await.unwrap();
    assert!(report.settled_recommendations.is_empty());
    let rep = h.cs.reputation("alice").await.unwrap().unwrap();
    assert_eq!(rep.counters.rejected, 1);
}
