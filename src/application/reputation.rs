use crate::application::retry::{upsert_with_retry, RetryPolicy};
use crate::domain::entities::trading_signal::SignalPerformance;
use crate::domain::entities::user_reputation::UserReputation;
use crate::domain::error::DomainError;
use crate::domain::events::DomainEvent;
use crate::domain::ports::clock::Clock;
use crate::domain::ports::notifier::Notifier;
use crate::domain::ports::record_store::{RecordFilter, RecordStore, SortOrder};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Per-user trust score, level and badges.
///
/// Entries are created lazily: every recording operation works for a user the
/// ledger has never seen.
pub struct ReputationUseCase {
    store: Arc<dyn RecordStore<UserReputation>>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl ReputationUseCase {
    pub fn new(
        store: Arc<dyn RecordStore<UserReputation>>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            policy,
        }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<UserReputation>, DomainError> {
        self.store.get(user_id).await
    }

    /// Current score, zero for unknown users.
    pub async fn score_of(&self, user_id: &str) -> Result<f64, DomainError> {
        Ok(self.store.get(user_id).await?.map(|r| r.score).unwrap_or(0.0))
    }

    /// Fetch the entry, creating an empty one if the user is new.
    pub async fn ensure(&self, user_id: &str) -> Result<UserReputation, DomainError> {
        if let Some(rep) = self.store.get(user_id).await? {
            return Ok(rep);
        }
        match self.store.put(&UserReputation::new(user_id.to_string(), self.clock.now())).await {
            Ok(rep) => Ok(rep),
            Err(e) if e.is_conflict() => self
                .store
                .get(user_id)
                .await?
                .ok_or_else(|| DomainError::NotFound(format!("user_reputation {user_id}"))),
            Err(e) => Err(e),
        }
    }

    pub async fn record_recommendation_outcome(
        &self,
        user_id: &str,
        was_approved: bool,
    ) -> Result<UserReputation, DomainError> {
        tracing::debug!(%user_id, was_approved, "recording recommendation outcome");
        self.apply(user_id, |rep, now| rep.record_outcome(was_approved, now)).await
    }

    pub async fn record_vote_received(
        &self,
        user_id: &str,
        was_helpful: bool,
    ) -> Result<UserReputation, DomainError> {
        self.apply(user_id, |rep, now| rep.record_vote_received(was_helpful, now)).await
    }

    pub async fn record_follower_change(&self, user_id: &str, delta: i64) -> Result<UserReputation, DomainError> {
        self.apply(user_id, |rep, now| rep.record_follower_change(delta, now)).await
    }

    /// Idempotent crediting of one recommendation's vote tallies and, once
    /// resolved, its outcome. Used by the vetting pipeline so that a retried
    /// or reconciled follow-up never double counts.
    pub async fn credit_recommendation(
        &self,
        user_id: &str,
        recommendation_id: &str,
        votes: u64,
        helpful: u64,
        outcome: Option<bool>,
    ) -> Result<UserReputation, DomainError> {
        self.apply(user_id, |rep, now| {
            rep.credit_recommendation(recommendation_id, votes, helpful, outcome, now)
        })
        .await
    }

    /// Realized signal performance counts as one helpful or unhelpful vote.
    pub async fn record_signal_performance(
        &self,
        user_id: &str,
        performance: &SignalPerformance,
    ) -> Result<UserReputation, DomainError> {
        self.record_vote_received(user_id, performance.was_helpful()).await
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<UserReputation>, DomainError> {
        self.store
            .query(&RecordFilter::default(), SortOrder::HighestRank, Some(limit))
            .await
    }

    async fn apply<F>(&self, user_id: &str, change: F) -> Result<UserReputation, DomainError>
    where
        F: Fn(&mut UserReputation, DateTime<Utc>) -> Vec<DomainEvent> + Send + Sync,
    {
        let now = self.clock.now();
        let (stored, events) = upsert_with_retry(
            self.store.as_ref(),
            user_id,
            self.policy,
            || UserReputation::new(user_id.to_string(), now),
            |rep| Ok(change(rep, now)),
        )
        .await?;

        if !events.is_empty() {
            tracing::info!(%user_id, score = stored.score, level = %stored.level, events = events.len(), "reputation milestones");
        }
        self.notifier.notify_all(events);
        Ok(stored)
    }
}
