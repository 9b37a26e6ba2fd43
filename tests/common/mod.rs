//! Shared test helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use crowdsignal::application::retry::RetryPolicy;
use crowdsignal::domain::entities::recommendation::{Recommendation, RecommendationContent};
use crowdsignal::domain::error::DomainError;
use crowdsignal::domain::events::DomainEvent;
use crowdsignal::domain::ports::record_store::{Record, RecordFilter, RecordStore, SnapshotStream, SortOrder};
use crowdsignal::domain::values::asset_type::AssetType;
use crowdsignal::domain::values::risk_level::RiskLevel;
use crowdsignal::domain::values::signal_direction::SignalDirection;
use crowdsignal::domain::values::time_horizon::TimeHorizon;
use crowdsignal::domain::values::vote_direction::VoteDirection;
use crowdsignal::infrastructure::clock::ManualClock;
use crowdsignal::infrastructure::memory::memory_store::MemoryStore;
use crowdsignal::infrastructure::notify::broadcast::BroadcastNotifier;
use crowdsignal::{CrowdSignal, Stores};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub struct Harness {
    pub cs: Arc<CrowdSignal>,
    pub clock: Arc<ManualClock>,
    pub events: broadcast::Receiver<DomainEvent>,
}

impl Harness {
    /// Everything delivered to the notifier since the last drain.
    pub fn drain_events(&mut self) -> Vec<DomainEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

pub fn day0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap()
}

/// Generous retry bound so contention tests never exhaust attempts.
pub fn test_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 500,
        backoff: Duration::ZERO,
    }
}

pub fn setup_with(stores: Stores) -> Harness {
    let clock = Arc::new(ManualClock::new(day0()));
    let notifier = Arc::new(BroadcastNotifier::new(4096));
    let events = notifier.receiver();
    let cs = CrowdSignal::with_parts(stores, notifier, clock.clone(), test_policy());
    Harness {
        cs: Arc::new(cs),
        clock,
        events,
    }
}

pub fn setup() -> Harness {
    setup_with(Stores::memory())
}

pub fn content(direction: SignalDirection, risk: RiskLevel, horizon: TimeHorizon) -> RecommendationContent {
    RecommendationContent {
        asset_type: AssetType::Stock,
        symbol: Some("ACME".into()),
        name: Some("Acme Corp".into()),
        current_price: Some(100.0),
        price_change_pct: Some(1.5),
        direction,
        reasoning: "Backlog growth with expanding margins".into(),
        target_price: None,
        time_horizon: horizon,
        risk_level: risk,
        analysis: None,
    }
}

pub fn buy_content() -> RecommendationContent {
    content(SignalDirection::Buy, RiskLevel::High, TimeHorizon::Short)
}

pub async fn submit(h: &Harness, submitter: &str) -> Recommendation {
    h.cs
        .submit(submitter.into(), submitter.to_uppercase(), buy_content())
        .await
        .unwrap()
}

/// Cast `ups` then `downs` weight-1 votes from fresh voters.
pub async fn vote_many(h: &Harness, rec_id: &str, ups: usize, downs: usize) {
    for i in 0..ups {
        h.cs
            .apply_vote(rec_id, &format!("up-{i}"), VoteDirection::Up, 0.0, None)
            .await
            .unwrap();
    }
    for i in 0..downs {
        h.cs
            .apply_vote(rec_id, &format!("down-{i}"), VoteDirection::Down, 0.0, None)
            .await
            .unwrap();
    }
}

/// Submit and approve with 7 up / 3 down.
pub async fn approved(h: &Harness, submitter: &str) -> Recommendation {
    let rec = submit(h, submitter).await;
    vote_many(h, &rec.id, 7, 3).await;
    h.cs.recommendation(&rec.id).await.unwrap()
}

/// Memory store whose writes fail with a database error while switched on.
pub struct FailingStore<T: Record> {
    inner: MemoryStore<T>,
    failing: AtomicBool,
}

impl<T: Record> FailingStore<T> {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DomainError::Database("disk I/O".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for FailingStore<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, DomainError> {
        self.inner.get(id).await
    }

    async fn put(&self, record: &T) -> Result<T, DomainError> {
        self.check()?;
        self.inner.put(record).await
    }

    async fn compare_and_swap(&self, record: &T) -> Result<T, DomainError> {
        self.check()?;
        self.inner.compare_and_swap(record).await
    }

    async fn query(
        &self,
        filter: &RecordFilter,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<T>, DomainError> {
        self.inner.query(filter, order, limit).await
    }

    fn subscribe(&self, filter: RecordFilter, order: SortOrder, limit: Option<usize>) -> SnapshotStream<T> {
        self.inner.subscribe(filter, order, limit)
    }
}
