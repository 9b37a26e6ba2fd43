mod common;

use chrono::Duration;
use common::*;
use crowdsignal::domain::entities::trading_signal::SignalPerformance;
use crowdsignal::domain::error::DomainError;
use crowdsignal::domain::events::DomainEvent;
use crowdsignal::domain::values::risk_level::RiskLevel;
use crowdsignal::domain::values::signal_direction::SignalDirection;
use crowdsignal::domain::values::signal_status::SignalStatus;
use crowdsignal::domain::values::time_horizon::TimeHorizon;

#[tokio::test]
async fn test_approval_synthesizes_price_levels() {
    let mut h = setup();
    let rec = approved(&h, "alice").await;

    let signal = h.cs.signal_for(&rec.id).await.unwrap().unwrap();
    assert_eq!(rec.signal_id.as_deref(), Some(signal.id.as_str()));
    assert_eq!(signal.recommendation_id, rec.id);
    assert_eq!(signal.direction, SignalDirection::Buy);
    assert_eq!(signal.status, SignalStatus::Active);
    assert_eq!(signal.current_price, Some(100.0));
    // high risk: 12% stop, 24% derived target
    assert_eq!(signal.stop_loss, Some(88.0));
    assert_eq!(signal.target_price, Some(124.0));
    assert_eq!(signal.confidence.value(), 70.0);
    // weighted score 4 → 40
    assert_eq!(signal.community_score, 40.0);
    assert_eq!(signal.created_at, day0());
    assert_eq!(signal.expires_at, day0() + Duration::days(7));
    assert!(signal.subscribers.is_empty());

    let created: Vec<_> = h
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, DomainEvent::SignalCreated { .. }))
        .collect();
    assert_eq!(
        created,
        vec![DomainEvent::SignalCreated {
            id: signal.id.clone(),
            source_recommendation_id: rec.id.clone(),
        }]
    );
}

#[tokio::test]
async fn test_submitted_target_wins() {
    let h = setup();
    let mut c = content(SignalDirection::Sell, RiskLevel::Low, TimeHorizon::Long);
    c.target_price = Some(80.0);
    let rec = h.cs.submit("alice".into(), "Alice".into(), c).await.unwrap();
    vote_many(&h, &rec.id, 7, 3).await;

    let signal = h.cs.signal_for(&rec.id).await.unwrap().unwrap();
    assert_eq!(signal.direction, SignalDirection::Sell);
    assert_eq!(signal.stop_loss, Some(105.0));
    assert_eq!(signal.target_price, Some(80.0));
    assert_eq!(signal.expires_at, day0() + Duration::days(90));
}

#[tokio::test]
async fn test_watch_signal_has_no_levels() {
    let h = setup();
    let c = content(SignalDirection::Watch, RiskLevel::Medium, TimeHorizon::Medium);
    let rec = h.cs.submit("alice".into(), "Alice".into(), c).await.unwrap();
    vote_many(&h, &rec.id, 7, 3).await;

    let signal = h.cs.signal_for(&rec.id).await.unwrap().unwrap();
    assert_eq!(signal.stop_loss, None);
    assert_eq!(signal.target_price, None);
    assert_eq!(signal.expires_at, day0() + Duration::days(30));
}

#[tokio::test]
async fn test_convert_twice_is_already_converted() {
    let h = setup();
    let rec = approved(&h, "alice").await;

    let err = h.cs.convert(&rec.id).await.unwrap_err();
    assert!(matches!(err, DomainError::AlreadyConverted(ref id) if id == &rec.id));
    assert_eq!(h.cs.active_signals(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_convert_requires_approval() {
    let h = setup();
    let rec = submit(&h, "alice").await;
    vote_many(&h, &rec.id, 3, 0).await;

    let err = h.cs.convert(&rec.id).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));
    assert!(h.cs.signal_for(&rec.id).await.unwrap().is_none());

    let err = h.cs.convert("missing").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn test_confidence_boosted_by_submitter_reputation() {
    let h = setup();
    // 20/20 history: well past the +10 threshold
    for _ in 0..20 {
        h.cs.record_recommendation_outcome("veteran", true).await.unwrap();
    }
    let rec = approved(&h, "veteran").await;
    let signal = h.cs.signal_for(&rec.id).await.unwrap().unwrap();
    assert_eq!(signal.confidence.value(), 80.0);
    assert!(signal.submitter_reputation >= 80.0);

    // two prior approvals land the submitter between 50 and 80
    for _ in 0..2 {
        h.cs.record_recommendation_outcome("regular", true).await.unwrap();
    }
    let rec = approved(&h, "regular").await;
    let signal = h.cs.signal_for(&rec.id).await.unwrap().unwrap();
    assert_eq!(signal.submitter_reputation, 54.0);
    assert_eq!(signal.confidence.value(), 75.0);
}

#[tokio::test]
async fn test_subscribe_and_unsubscribe() {
    let h = setup();
    let rec = approved(&h, "alice").await;
    let signal_id = rec.signal_id.unwrap();

    let signal = h.cs.subscribe(&signal_id, "bob").await.unwrap();
    assert!(signal.subscribers.contains("bob"));

    let err = h.cs.subscribe(&signal_id, "bob").await.unwrap_err();
    assert!(matches!(err, DomainError::AlreadySubscribed { .. }));

    let signal = h.cs.unsubscribe(&signal_id, "bob").await.unwrap();
    assert!(signal.subscribers.is_empty());

    // removing an absent subscriber writes nothing
    let before = h.cs.signal(&signal_id).await.unwrap();
    let after = h.cs.unsubscribe(&signal_id, "bob").await.unwrap();
    assert_eq!(after.version, before.version);

    let err = h.cs.subscribe("missing", "bob").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn test_close_feeds_performance_back() {
    let mut h = setup();
    let rec = approved(&h, "alice").await;
    let signal_id = rec.signal_id.unwrap();
    let before = h.cs.reputation("alice").await.unwrap().unwrap();
    h.drain_events();

    h.clock.advance(Duration::days(2));
    let perf = SignalPerformance {
        entry_price: 100.0,
        exit_price: 125.0,
        actual_return: 0.25,
        hit_target: true,
        hit_stop_loss: false,
    };
    let closed = h
        .cs
        .close_signal(&signal_id, SignalStatus::Triggered, Some(perf.clone()))
        .await
        .unwrap();
    assert_eq!(closed.status, SignalStatus::Triggered);
    assert_eq!(closed.performance, Some(perf));
    assert_eq!(closed.closed_at, Some(day0() + Duration::days(2)));

    let after = h.cs.reputation("alice").await.unwrap().unwrap();
    assert_eq!(
        after.counters.total_votes_received,
        before.counters.total_votes_received + 1
    );
    assert_eq!(after.counters.helpful_votes, before.counters.helpful_votes + 1);

    assert!(h.drain_events().contains(&DomainEvent::SignalStatusChanged {
        id: signal_id.clone(),
        new_status: SignalStatus::Triggered,
    }));
    assert!(h.cs.active_signals(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_closed_signal_rejects_changes() {
    let h = setup();
    let rec = approved(&h, "alice").await;
    let signal_id = rec.signal_id.unwrap();

    h.cs
        .close_signal(&signal_id, SignalStatus::Cancelled, None)
        .await
        .unwrap();

    let err = h
        .cs
        .close_signal(&signal_id, SignalStatus::Expired, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));

    let err = h.cs.subscribe(&signal_id, "bob").await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_stopped_out_close_is_unhelpful() {
    let h = setup();
    let rec = approved(&h, "alice").await;
    let signal_id = rec.signal_id.unwrap();
    let before = h.cs.reputation("alice").await.unwrap().unwrap();

    let perf = SignalPerformance {
        entry_price: 100.0,
        exit_price: 88.0,
        actual_return: -0.12,
        hit_target: false,
        hit_stop_loss: true,
    };
    h.cs
        .close_signal(&signal_id, SignalStatus::Triggered, Some(perf))
        .await
        .unwrap();

    let after = h.cs.reputation("alice").await.unwrap().unwrap();
    assert_eq!(
        after.counters.total_votes_received,
        before.counters.total_votes_received + 1
    );
    assert_eq!(after.counters.helpful_votes, before.counters.helpful_votes);
}

#[tokio::test]
async fn test_active_signals_ranked_by_confidence() {
    let h = setup();
    for _ in 0..20 {
        h.cs.record_recommendation_outcome("veteran", true).await.unwrap();
    }
    let plain = approved(&h, "alice").await;
    let boosted = approved(&h, "veteran").await;

    let active = h.cs.active_signals(None).await.unwrap();
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].recommendation_id, boosted.id);
    assert_eq!(active[1].recommendation_id, plain.id);

    let top = h.cs.active_signals(Some(1)).await.unwrap();
    assert_eq!(top.len(), 1);
}
