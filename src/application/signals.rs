use crate::application::reputation::ReputationUseCase;
use crate::application::retry::{update_if_changed, update_with_retry, RetryPolicy};
use crate::domain::entities::recommendation::Recommendation;
use crate::domain::entities::trading_signal::{SignalPerformance, TradingSignal};
use crate::domain::error::DomainError;
use crate::domain::events::DomainEvent;
use crate::domain::ports::clock::Clock;
use crate::domain::ports::notifier::Notifier;
use crate::domain::ports::record_store::{RecordFilter, RecordStore, SnapshotStream, SortOrder};
use crate::domain::synthesis::synthesize_signal;
use crate::domain::values::signal_status::SignalStatus;
use std::sync::Arc;

/// Converts approved recommendations into signals and tracks their lifecycle.
pub struct SignalUseCase {
    store: Arc<dyn RecordStore<TradingSignal>>,
    recommendations: Arc<dyn RecordStore<Recommendation>>,
    reputation: Arc<ReputationUseCase>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl SignalUseCase {
    pub fn new(
        store: Arc<dyn RecordStore<TradingSignal>>,
        recommendations: Arc<dyn RecordStore<Recommendation>>,
        reputation: Arc<ReputationUseCase>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            recommendations,
            reputation,
            notifier,
            clock,
            policy,
        }
    }

    /// Turn an approved recommendation into its one signal.
    ///
    /// The signal id is claimed on the recommendation first, so concurrent or
    /// repeated calls race on that claim and exactly one signal is stored. A
    /// claim whose signal was never written (e.g. the process died between the
    /// two writes) is completed by the next call.
    pub async fn convert(&self, recommendation_id: &str) -> Result<TradingSignal, DomainError> {
        let rec = self
            .recommendations
            .get(recommendation_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("recommendation {recommendation_id}")))?;

        let claimed = if let Some(signal_id) = rec.signal_id.clone() {
            if self.store.get(&signal_id).await?.is_some() {
                return Err(DomainError::AlreadyConverted(rec.id.clone()));
            }
            tracing::warn!(recommendation_id = %rec.id, %signal_id, "completing unfinished conversion");
            rec
        } else {
            let now = self.clock.now();
            let (claimed, ()) = update_with_retry(
                self.recommendations.as_ref(),
                recommendation_id,
                self.policy,
                |r| r.claim_signal(uuid::Uuid::new_v4().to_string(), now),
            )
            .await?;
            claimed
        };

        let signal_id = claimed
            .signal_id
            .clone()
            .ok_or_else(|| DomainError::AlreadyConverted(claimed.id.clone()))?;
        let synthesized_at = claimed.signal_claimed_at.unwrap_or_else(|| self.clock.now());
        let submitter_reputation = match self.reputation.get(&claimed.submitter_id).await? {
            Some(rep) => rep.score,
            None => claimed.submitter_reputation,
        };

        let signal = synthesize_signal(&claimed, &signal_id, submitter_reputation, synthesized_at)?;
        let stored = match self.store.put(&signal).await {
            Ok(stored) => stored,
            Err(e) if e.is_conflict() => return Err(DomainError::AlreadyConverted(claimed.id.clone())),
            Err(e) => return Err(e),
        };

        tracing::info!(
            signal_id = %stored.id,
            recommendation_id = %claimed.id,
            direction = %stored.direction,
            confidence = %stored.confidence,
            "signal created"
        );
        self.notifier.notify(DomainEvent::SignalCreated {
            id: stored.id.clone(),
            source_recommendation_id: claimed.id.clone(),
        });
        Ok(stored)
    }

    pub async fn get(&self, id: &str) -> Result<TradingSignal, DomainError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("signal {id}")))
    }

    /// The signal linked to a recommendation, if it has been created.
    pub async fn for_recommendation(&self, recommendation_id: &str) -> Result<Option<TradingSignal>, DomainError> {
        let rec = self
            .recommendations
            .get(recommendation_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("recommendation {recommendation_id}")))?;
        match rec.signal_id {
            Some(signal_id) => self.store.get(&signal_id).await,
            None => Ok(None),
        }
    }

    pub async fn subscribe(&self, signal_id: &str, user_id: &str) -> Result<TradingSignal, DomainError> {
        let (stored, ()) = update_with_retry(self.store.as_ref(), signal_id, self.policy, |s| s.subscribe(user_id)).await?;
        tracing::debug!(%signal_id, %user_id, subscribers = stored.subscribers.len(), "subscribed");
        Ok(stored)
    }

    /// Removing a subscriber that is not subscribed is a no-op.
    pub async fn unsubscribe(&self, signal_id: &str, user_id: &str) -> Result<TradingSignal, DomainError> {
        let current = self.get(signal_id).await?;
        if !current.subscribers.contains(user_id) {
            return Ok(current);
        }
        let (stored, _) = update_with_retry(self.store.as_ref(), signal_id, self.policy, |s| Ok(s.unsubscribe(user_id))).await?;
        Ok(stored)
    }

    /// Close an active signal. Realized performance, when given, is fed back
    /// into the submitter's reputation.
    pub async fn transition(
        &self,
        signal_id: &str,
        status: SignalStatus,
        performance: Option<SignalPerformance>,
    ) -> Result<TradingSignal, DomainError> {
        let now = self.clock.now();
        let (stored, ()) = update_with_retry(self.store.as_ref(), signal_id, self.policy, |s| {
            s.transition(status, performance.clone(), now)
        })
        .await?;

        tracing::info!(%signal_id, status = %stored.status, "signal closed");
        self.notifier.notify(DomainEvent::SignalStatusChanged {
            id: stored.id.clone(),
            new_status: stored.status,
        });

        if let Some(perf) = &stored.performance {
            self.reputation
                .record_signal_performance(&stored.submitter_id, perf)
                .await?;
        }
        Ok(stored)
    }

    pub async fn active(&self, limit: Option<usize>) -> Result<Vec<TradingSignal>, DomainError> {
        self.store
            .query(
                &RecordFilter::with_statuses([SignalStatus::Active]),
                SortOrder::HighestRank,
                limit,
            )
            .await
    }

    pub fn watch_active(&self, limit: Option<usize>) -> SnapshotStream<TradingSignal> {
        self.store.subscribe(
            RecordFilter::with_statuses([SignalStatus::Active]),
            SortOrder::HighestRank,
            limit,
        )
    }

    /// Expire active signals whose expiry has passed. Returns the expired ids.
    pub async fn expire_stale(&self) -> Result<Vec<String>, DomainError> {
        let now = self.clock.now();
        let due = self
            .store
            .query(
                &RecordFilter {
                    expires_before: Some(now),
                    ..RecordFilter::with_statuses([SignalStatus::Active])
                },
                SortOrder::OldestFirst,
                None,
            )
            .await?;

        let mut expired = Vec::new();
        for signal in due {
            let result = update_if_changed(self.store.as_ref(), &signal.id, self.policy, |s| {
                if s.status.is_terminal() || !s.is_past_expiry(now) {
                    return Ok(None);
                }
                s.transition(SignalStatus::Expired, None, now)?;
                Ok(Some(()))
            })
            .await;
            match result {
                Ok((stored, Some(()))) => {
                    self.notifier.notify(DomainEvent::SignalStatusChanged {
                        id: stored.id.clone(),
                        new_status: SignalStatus::Expired,
                    });
                    expired.push(stored.id);
                }
                Ok((_, None)) => {}
                Err(DomainError::NotFound(_)) => {
                    tracing::warn!(signal_id = %signal.id, "signal vanished during sweep");
                }
                Err(e) => return Err(e),
            }
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "expired stale signals");
        }
        Ok(expired)
    }
}
