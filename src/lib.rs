pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::reputation::ReputationUseCase;
use crate::application::retry::RetryPolicy;
use crate::application::signals::SignalUseCase;
use crate::application::sweep::{SweepReport, SweepUseCase};
use crate::application::vetting::{VettingUseCase, VoteReceipt};
use crate::config::{NotifierKind, Settings, StoreBackend};
use crate::domain::entities::recommendation::{Recommendation, RecommendationContent};
use crate::domain::entities::trading_signal::{SignalPerformance, TradingSignal};
use crate::domain::entities::user_reputation::UserReputation;
use crate::domain::error::DomainError;
use crate::domain::ports::clock::Clock;
use crate::domain::ports::notifier::Notifier;
use crate::domain::ports::record_store::{RecordStore, SnapshotStream};
use crate::domain::values::signal_status::SignalStatus;
use crate::domain::values::vote_direction::VoteDirection;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::memory::memory_store::MemoryStore;
use crate::infrastructure::notify::noop::NoopNotifier;
use crate::infrastructure::notify::tracing_notifier::TracingNotifier;
use crate::infrastructure::sqlite::record_store::SqliteStore;
use std::sync::Arc;

/// One store per entity type.
#[derive(Clone)]
pub struct Stores {
    pub recommendations: Arc<dyn RecordStore<Recommendation>>,
    pub reputations: Arc<dyn RecordStore<UserReputation>>,
    pub signals: Arc<dyn RecordStore<TradingSignal>>,
}

impl Stores {
    pub fn memory() -> Self {
        Self {
            recommendations: Arc::new(MemoryStore::<Recommendation>::new()),
            reputations: Arc::new(MemoryStore::<UserReputation>::new()),
            signals: Arc::new(MemoryStore::<TradingSignal>::new()),
        }
    }

    pub fn sqlite(db_path: &str) -> Result<Self, DomainError> {
        Ok(Self {
            recommendations: Arc::new(SqliteStore::<Recommendation>::open(db_path)?),
            reputations: Arc::new(SqliteStore::<UserReputation>::open(db_path)?),
            signals: Arc::new(SqliteStore::<TradingSignal>::open(db_path)?),
        })
    }
}

pub struct CrowdSignal {
    vetting_uc: Arc<VettingUseCase>,
    reputation_uc: Arc<ReputationUseCase>,
    signal_uc: Arc<SignalUseCase>,
    sweep_uc: SweepUseCase,
}

impl CrowdSignal {
    pub fn new(settings: &Settings) -> Result<Self, DomainError> {
        let stores = match settings.store {
            StoreBackend::Sqlite => Stores::sqlite(&settings.db_path)?,
            StoreBackend::Memory => Stores::memory(),
        };
        let notifier: Arc<dyn Notifier> = match settings.notifier {
            NotifierKind::Tracing => Arc::new(TracingNotifier),
            NotifierKind::None => Arc::new(NoopNotifier),
        };
        Ok(Self::with_parts(
            stores,
            notifier,
            Arc::new(SystemClock),
            settings.retry_policy(),
        ))
    }

    /// Memory-backed instance with the system clock and no notifications.
    pub fn in_memory() -> Self {
        Self::with_parts(
            Stores::memory(),
            Arc::new(NoopNotifier),
            Arc::new(SystemClock),
            RetryPolicy::default(),
        )
    }

    pub fn with_parts(
        stores: Stores,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        let reputation_uc = Arc::new(ReputationUseCase::new(
            stores.reputations,
            notifier.clone(),
            clock.clone(),
            policy,
        ));
        let signal_uc = Arc::new(SignalUseCase::new(
            stores.signals,
            stores.recommendations.clone(),
            reputation_uc.clone(),
            notifier.clone(),
            clock.clone(),
            policy,
        ));
        let vetting_uc = Arc::new(VettingUseCase::new(
            stores.recommendations,
            reputation_uc.clone(),
            signal_uc.clone(),
            notifier,
            clock.clone(),
            policy,
        ));
        let sweep_uc = SweepUseCase::new(vetting_uc.clone(), signal_uc.clone(), clock);

        Self {
            vetting_uc,
            reputation_uc,
            signal_uc,
            sweep_uc,
        }
    }

    // Vetting

    pub async fn submit(
        &self,
        submitter_id: String,
        submitter_name: String,
        content: RecommendationContent,
    ) -> Result<Recommendation, DomainError> {
        self.vetting_uc.submit(submitter_id, submitter_name, content).await
    }

    pub async fn recommendation(&self, id: &str) -> Result<Recommendation, DomainError> {
        self.vetting_uc.get(id).await
    }

    pub async fn apply_vote(
        &self,
        recommendation_id: &str,
        voter_id: &str,
        direction: VoteDirection,
        voter_reputation: f64,
        comment: Option<String>,
    ) -> Result<VoteReceipt, DomainError> {
        self.vetting_uc
            .apply_vote(recommendation_id, voter_id, direction, voter_reputation, comment)
            .await
    }

    pub async fn cast_vote(
        &self,
        recommendation_id: &str,
        voter_id: &str,
        direction: VoteDirection,
        comment: Option<String>,
    ) -> Result<VoteReceipt, DomainError> {
        self.vetting_uc
            .cast_vote(recommendation_id, voter_id, direction, comment)
            .await
    }

    pub async fn queue(&self, limit: Option<usize>) -> Result<Vec<Recommendation>, DomainError> {
        self.vetting_uc.queue(limit).await
    }

    pub async fn pending(&self, limit: Option<usize>) -> Result<Vec<Recommendation>, DomainError> {
        self.vetting_uc.pending(limit).await
    }

    pub fn watch_queue(&self, limit: Option<usize>) -> SnapshotStream<Recommendation> {
        self.vetting_uc.watch_queue(limit)
    }

    pub async fn recommendations_by(
        &self,
        submitter_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Recommendation>, DomainError> {
        self.vetting_uc.by_submitter(submitter_id, limit).await
    }

    // Reputation

    pub async fn reputation(&self, user_id: &str) -> Result<Option<UserReputation>, DomainError> {
        self.reputation_uc.get(user_id).await
    }

    pub async fn record_recommendation_outcome(
        &self,
        user_id: &str,
        was_approved: bool,
    ) -> Result<UserReputation, DomainError> {
        self.reputation_uc
            .record_recommendation_outcome(user_id, was_approved)
            .await
    }

    pub async fn record_vote_received(
        &self,
        user_id: &str,
        was_helpful: bool,
    ) -> Result<UserReputation, DomainError> {
        self.reputation_uc.record_vote_received(user_id, was_helpful).await
    }

    pub async fn record_follower_change(&self, user_id: &str, delta: i64) -> Result<UserReputation, DomainError> {
        self.reputation_uc.record_follower_change(user_id, delta).await
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<UserReputation>, DomainError> {
        self.reputation_uc.leaderboard(limit).await
    }

    // Signals

    pub async fn convert(&self, recommendation_id: &str) -> Result<TradingSignal, DomainError> {
        self.signal_uc.convert(recommendation_id).await
    }

    pub async fn signal(&self, id: &str) -> Result<TradingSignal, DomainError> {
        self.signal_uc.get(id).await
    }

    pub async fn signal_for(&self, recommendation_id: &str) -> Result<Option<TradingSignal>, DomainError> {
        self.signal_uc.for_recommendation(recommendation_id).await
    }

    pub async fn active_signals(&self, limit: Option<usize>) -> Result<Vec<TradingSignal>, DomainError> {
        self.signal_uc.active(limit).await
    }

    pub fn watch_signals(&self, limit: Option<usize>) -> SnapshotStream<TradingSignal> {
        self.signal_uc.watch_active(limit)
    }

    pub async fn subscribe(&self, signal_id: &str, user_id: &str) -> Result<TradingSignal, DomainError> {
        self.signal_uc.subscribe(signal_id, user_id).await
    }

    pub async fn unsubscribe(&self, signal_id: &str, user_id: &str) -> Result<TradingSignal, DomainError> {
        self.signal_uc.unsubscribe(signal_id, user_id).await
    }

    pub async fn close_signal(
        &self,
        signal_id: &str,
        status: SignalStatus,
        performance: Option<SignalPerformance>,
    ) -> Result<TradingSignal, DomainError> {
        self.signal_uc.transition(signal_id, status, performance).await
    }

    // Maintenance

    pub async fn sweep(&self) -> Result<SweepReport, DomainError> {
        self.sweep_uc.execute().await
    }
}
