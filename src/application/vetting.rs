use crate::application::reputation::ReputationUseCase;
use crate::application::retry::{update_if_changed, update_with_retry, RetryPolicy};
use crate::application::signals::SignalUseCase;
use crate::domain::entities::recommendation::{Recommendation, RecommendationContent};
use crate::domain::entities::trading_signal::TradingSignal;
use crate::domain::error::DomainError;
use crate::domain::events::DomainEvent;
use crate::domain::ports::clock::Clock;
use crate::domain::ports::notifier::Notifier;
use crate::domain::ports::record_store::{RecordFilter, RecordStore, SnapshotStream, SortOrder};
use crate::domain::values::vetting_status::VettingStatus;
use crate::domain::values::vote_direction::VoteDirection;
use serde::Serialize;
use std::sync::Arc;

/// Result of a successfully applied vote.
#[derive(Debug, Clone, Serialize)]
pub struct VoteReceipt {
    pub recommendation: Recommendation,
    /// Terminal status reached by this vote.
    pub resolution: Option<VettingStatus>,
    /// Signal created because this vote approved the recommendation.
    pub signal: Option<TradingSignal>,
}

pub struct VettingUseCase {
    store: Arc<dyn RecordStore<Recommendation>>,
    reputation: Arc<ReputationUseCase>,
    signals: Arc<SignalUseCase>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl VettingUseCase {
    pub fn new(
        store: Arc<dyn RecordStore<Recommendation>>,
        reputation: Arc<ReputationUseCase>,
        signals: Arc<SignalUseCase>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            reputation,
            signals,
            notifier,
            clock,
            policy,
        }
    }

    pub async fn submit(
        &self,
        submitter_id: String,
        submitter_name: String,
        content: RecommendationContent,
    ) -> Result<Recommendation, DomainError> {
        if submitter_id.trim().is_empty() {
            return Err(DomainError::InvalidInput("submitter id must not be empty".into()));
        }
        content.validate()?;

        let submitter = self.reputation.ensure(&submitter_id).await?;
        let rec = Recommendation::new(
            submitter_id,
            submitter_name,
            submitter.score,
            content,
            self.clock.now(),
        );
        let stored = self.store.put(&rec).await?;
        tracing::info!(
            recommendation_id = %stored.id,
            submitter_id = %stored.submitter_id,
            asset_type = %stored.content.asset_type,
            direction = %stored.content.direction,
            "recommendation submitted"
        );
        Ok(stored)
    }

    pub async fn get(&self, id: &str) -> Result<Recommendation, DomainError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("recommendation {id}")))
    }

    /// Vote with the voter's current ledger score.
    pub async fn cast_vote(
        &self,
        recommendation_id: &str,
        voter_id: &str,
        direction: VoteDirection,
        comment: Option<String>,
    ) -> Result<VoteReceipt, DomainError> {
        let voter_reputation = self.reputation.score_of(voter_id).await?;
        self.apply_vote(recommendation_id, voter_id, direction, voter_reputation, comment)
            .await
    }

    /// Apply one vote and settle whatever it resolves.
    ///
    /// Counter updates and threshold evaluation commit as one write. Once that
    /// write lands the vote counts: later failures crediting the submitter or
    /// creating the signal are logged and left on the recommendation as
    /// unsettled work for [`VettingUseCase::settle_outstanding`]. Only the write
    /// that moves the recommendation into a terminal state announces the
    /// resolution, so it fires once no matter how many votes race.
    pub async fn apply_vote(
        &self,
        recommendation_id: &str,
        voter_id: &str,
        direction: VoteDirection,
        voter_reputation: f64,
        comment: Option<String>,
    ) -> Result<VoteReceipt, DomainError> {
        if voter_id.trim().is_empty() {
            return Err(DomainError::InvalidInput("voter id must not be empty".into()));
        }
        let now = self.clock.now();
        let (rec, resolution) = update_with_retry(self.store.as_ref(), recommendation_id, self.policy, |rec| {
            rec.apply_vote(voter_id, direction, voter_reputation, comment.clone(), now)
        })
        .await?;

        tracing::debug!(
            %recommendation_id,
            %voter_id,
            %direction,
            weighted_score = rec.weighted_score,
            total_voters = rec.total_voters,
            "vote applied"
        );

        let signal = match resolution {
            Some(outcome) => {
                self.announce(&rec, outcome);
                match self.settle(&rec).await {
                    Ok(signal) => signal,
                    Err(e) => {
                        tracing::warn!(recommendation_id = %rec.id, error = %e, "settlement deferred to sweep");
                        self.signals.for_recommendation(&rec.id).await.ok().flatten()
                    }
                }
            }
            None => {
                if let Err(e) = self.credit_submitter(&rec).await {
                    tracing::warn!(recommendation_id = %rec.id, error = %e, "vote credit deferred");
                }
                None
            }
        };

        Ok(VoteReceipt {
            recommendation: rec,
            resolution,
            signal,
        })
    }

    fn announce(&self, rec: &Recommendation, outcome: VettingStatus) {
        tracing::info!(
            recommendation_id = %rec.id,
            %outcome,
            upvotes = rec.upvotes,
            downvotes = rec.downvotes,
            weighted_score = rec.weighted_score,
            "recommendation resolved"
        );
        self.notifier.notify(DomainEvent::RecommendationResolved {
            id: rec.id.clone(),
            outcome,
        });
    }

    /// Bring the submitter's counters up to this recommendation's tallies.
    async fn credit_submitter(&self, rec: &Recommendation) -> Result<(), DomainError> {
        self.reputation
            .credit_recommendation(
                &rec.submitter_id,
                &rec.id,
                rec.total_voters,
                rec.upvotes,
                rec.credited_outcome(),
            )
            .await?;
        Ok(())
    }

    /// Run every follow-up of a terminal recommendation, then mark it settled.
    /// Each step is idempotent, so a partial run is simply repeated.
    async fn settle(&self, rec: &Recommendation) -> Result<Option<TradingSignal>, DomainError> {
        let credited = self.credit_submitter(rec).await;

        let signal = if rec.status == VettingStatus::Approved {
            match self.signals.convert(&rec.id).await {
                Ok(signal) => Some(signal),
                Err(DomainError::AlreadyConverted(_)) => {
                    tracing::debug!(recommendation_id = %rec.id, "signal already created elsewhere");
                    self.signals.for_recommendation(&rec.id).await?
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };
        credited?;

        let now = self.clock.now();
        update_if_changed(self.store.as_ref(), &rec.id, self.policy, |r| {
            Ok(r.mark_settled(now).then_some(()))
        })
        .await?;
        Ok(signal)
    }

    /// Settle terminal recommendations whose follow-ups did not complete.
    /// Returns the ids settled by this pass.
    pub async fn settle_outstanding(&self) -> Result<Vec<String>, DomainError> {
        let due = self
            .store
            .query(
                &RecordFilter {
                    needs_follow_up: Some(true),
                    ..Default::default()
                },
                SortOrder::OldestFirst,
                None,
            )
            .await?;

        let mut settled = Vec::new();
        for rec in due {
            match self.settle(&rec).await {
                Ok(_) => settled.push(rec.id),
                Err(e) => {
                    tracing::warn!(recommendation_id = %rec.id, error = %e, "settlement still outstanding");
                }
            }
        }
        if !settled.is_empty() {
            tracing::info!(count = settled.len(), "settled outstanding recommendations");
        }
        Ok(settled)
    }

    /// Open items (pending and voting), oldest first.
    pub async fn queue(&self, limit: Option<usize>) -> Result<Vec<Recommendation>, DomainError> {
        self.store
            .query(
                &RecordFilter::with_statuses(VettingStatus::OPEN),
                SortOrder::OldestFirst,
                limit,
            )
            .await
    }

    /// Items nobody has voted on yet.
    pub async fn pending(&self, limit: Option<usize>) -> Result<Vec<Recommendation>, DomainError> {
        self.store
            .query(
                &RecordFilter::with_statuses([VettingStatus::Pending]),
                SortOrder::OldestFirst,
                limit,
            )
            .await
    }

    pub fn watch_queue(&self, limit: Option<usize>) -> SnapshotStream<Recommendation> {
        self.store.subscribe(
            RecordFilter::with_statuses(VettingStatus::OPEN),
            SortOrder::OldestFirst,
            limit,
        )
    }

    pub async fn by_submitter(
        &self,
        submitter_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Recommendation>, DomainError> {
        self.store
            .query(
                &RecordFilter {
                    owner: Some(submitter_id.to_string()),
                    ..Default::default()
                },
                SortOrder::NewestFirst,
                limit,
            )
            .await
    }

    /// Expire open recommendations past their voting window. Returns the
    /// expired ids. Expiry does not touch the submitter's outcome counters.
    pub async fn expire_stale(&self) -> Result<Vec<String>, DomainError> {
        let now = self.clock.now();
        let due = self
            .store
            .query(
                &RecordFilter {
                    expires_before: Some(now),
                    ..RecordFilter::with_statuses(VettingStatus::OPEN)
                },
                SortOrder::OldestFirst,
                None,
            )
            .await?;

        let mut expired = Vec::new();
        for rec in due {
            match update_if_changed(self.store.as_ref(), &rec.id, self.policy, |r| Ok(r.expire(now).then_some(()))).await {
                Ok((stored, Some(()))) => {
                    self.notifier.notify(DomainEvent::RecommendationResolved {
                        id: stored.id.clone(),
                        outcome: VettingStatus::Expired,
                    });
                    expired.push(stored.id);
                }
                Ok((_, None)) => {}
                Err(DomainError::NotFound(_)) => {
                    tracing::warn!(recommendation_id = %rec.id, "recommendation vanished during sweep");
                }
                Err(e) => return Err(e),
            }
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "expired stale recommendations");
        }
        Ok(expired)
    }
}
