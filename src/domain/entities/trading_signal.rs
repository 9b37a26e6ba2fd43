use crate::domain::error::DomainError;
use crate::domain::ports::record_store::Record;
use crate::domain::values::asset_type::AssetType;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::signal_direction::SignalDirection;
use crate::domain::values::signal_status::SignalStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Realized outcome attached when a signal closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalPerformance {
    pub entry_price: f64,
    pub exit_price: f64,
    /// Fractional return, e.g. 0.12 for +12%.
    pub actual_return: f64,
    #[serde(default)]
    pub hit_target: bool,
    #[serde(default)]
    pub hit_stop_loss: bool,
}

impl SignalPerformance {
    /// Whether the call counts as helpful feedback for its submitter.
    pub fn was_helpful(&self) -> bool {
        self.hit_target || (!self.hit_stop_loss && self.actual_return > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TradingSignal {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    pub recommendation_id: String,
    pub submitter_id: String,
    pub submitter_name: String,
    pub submitter_reputation: f64,
    pub direction: SignalDirection,
    pub asset_type: AssetType,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub current_price: Option<f64>,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub confidence: Confidence,
    pub community_score: f64,
    pub status: SignalStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub subscribers: BTreeSet<String>,
    pub performance: Option<SignalPerformance>,
}

impl TradingSignal {
    pub fn subscribe(&mut self, user_id: &str) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidTransition(format!(
                "signal {} is {}, subscriptions are closed",
                self.id, self.status
            )));
        }
        if !self.subscribers.insert(user_id.to_string()) {
            return Err(DomainError::AlreadySubscribed {
                signal_id: self.id.clone(),
                user_id: user_id.to_string(),
            });
        }
        Ok(())
    }

    /// Returns false when the user was not subscribed.
    pub fn unsubscribe(&mut self, user_id: &str) -> bool {
        self.subscribers.remove(user_id)
    }

    pub fn transition(
        &mut self,
        status: SignalStatus,
        performance: Option<SignalPerformance>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidTransition(format!(
                "signal {} is already {}",
                self.id, self.status
            )));
        }
        if status == SignalStatus::Active {
            return Err(DomainError::InvalidTransition(format!(
                "signal {} is already active",
                self.id
            )));
        }
        self.status = status;
        self.performance = performance;
        self.closed_at = Some(now);
        Ok(())
    }

    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl Record for TradingSignal {
    const KIND: &'static str = "trading_signal";

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn status_key(&self) -> &str {
        self.status.as_str()
    }

    fn owner_key(&self) -> Option<&str> {
        Some(&self.submitter_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        Some(self.expires_at)
    }

    fn rank(&self) -> f64 {
        self.confidence.value()
    }
}
