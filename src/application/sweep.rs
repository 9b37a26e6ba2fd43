use crate::application::signals::SignalUseCase;
use crate::application::vetting::VettingUseCase;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::error::DomainError;
use crate::domain::ports::clock::Clock;

#[derive(Debug, Serialize)]
pub struct SweepReport {
    pub swept_at: DateTime<Utc>,
    pub expired_recommendations: Vec<String>,
    /// Resolved recommendations whose outstanding follow-ups completed.
    pub settled_recommendations: Vec<String>,
    pub expired_signals: Vec<String>,
}

/// Periodic expiry and settlement pass over recommendations and signals.
/// Running it late only delays expiries; it never expires anything early.
pub struct SweepUseCase {
    vetting: Arc<VettingUseCase>,
    signals: Arc<SignalUseCase>,
    clock: Arc<dyn Clock>,
}

impl SweepUseCase {
    pub fn new(vetting: Arc<VettingUseCase>, signals: Arc<SignalUseCase>, clock: Arc<dyn Clock>) -> Self {
        Self {
            vetting,
            signals,
            clock,
        }
    }

    pub async fn execute(&self) -> Result<SweepReport, DomainError> {
        let swept_at = self.clock.now();
        let expired_recommendations = self.vetting.expire_stale().await?;
        let settled_recommendations = self.vetting.settle_outstanding().await?;
        let expired_signals = self.signals.expire_stale().await?;
        Ok(SweepReport {
            swept_at,
            expired_recommendations,
            settled_recommendations,
            expired_signals,
        })
    }
}
