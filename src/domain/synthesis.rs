//! Derivation of a trading signal from an approved recommendation.
//!
//! [`synthesize_signal`] is a pure function of the recommendation, the signal
//! id claimed for it, the submitter's reputation and a timestamp. Retrying a
//! conversion with the same inputs yields an identical signal.

use crate::domain::entities::recommendation::Recommendation;
use crate::domain::entities::trading_signal::TradingSignal;
use crate::domain::error::DomainError;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::risk_level::RiskLevel;
use crate::domain::values::signal_direction::SignalDirection;
use crate::domain::values::signal_status::SignalStatus;
use crate::domain::values::vetting_status::VettingStatus;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Reward distance used when the submitter gave no target, as a multiple of
/// the stop-loss distance.
pub const DEFAULT_REWARD_TO_RISK: f64 = 2.0;

fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

pub fn stop_loss(direction: SignalDirection, current_price: f64, risk: RiskLevel) -> Option<f64> {
    let pct = risk.stop_loss_pct();
    match direction {
        SignalDirection::Buy => Some(round_cents(current_price * (1.0 - pct))),
        SignalDirection::Sell => Some(round_cents(current_price * (1.0 + pct))),
        SignalDirection::Hold | SignalDirection::Watch => None,
    }
}

pub fn derived_target(direction: SignalDirection, current_price: f64, risk: RiskLevel) -> Option<f64> {
    let pct = risk.stop_loss_pct() * DEFAULT_REWARD_TO_RISK;
    match direction {
        SignalDirection::Buy => Some(round_cents(current_price * (1.0 + pct))),
        SignalDirection::Sell => Some(round_cents(current_price * (1.0 - pct))),
        SignalDirection::Hold | SignalDirection::Watch => None,
    }
}

/// `min(100, weightedScore * 10)`, floored at zero.
pub fn community_score(weighted_score: f64) -> f64 {
    (weighted_score * 10.0).clamp(0.0, 100.0)
}

pub fn synthesize_signal(
    rec: &Recommendation,
    signal_id: &str,
    submitter_reputation: f64,
    now: DateTime<Utc>,
) -> Result<TradingSignal, DomainError> {
    if rec.status != VettingStatus::Approved {
        return Err(DomainError::InvalidTransition(format!(
            "recommendation {} is {}, only approved recommendations convert",
            rec.id, rec.status
        )));
    }

    let content = &rec.content;
    let direction = content.direction;
    let risk = content.risk_level;

    let (stop, target) = match content.current_price {
        Some(price) => (
            stop_loss(direction, price, risk),
            if direction.is_directional() {
                content
                    .target_price
                    .or_else(|| derived_target(direction, price, risk))
            } else {
                None
            },
        ),
        None => (None, None),
    };

    let confidence =
        Confidence::from_approval_rate(rec.approval_rate()).boosted_by_reputation(submitter_reputation);

    Ok(TradingSignal {
        id: signal_id.to_string(),
        version: 0,
        recommendation_id: rec.id.clone(),
        submitter_id: rec.submitter_id.clone(),
        submitter_name: rec.submitter_name.clone(),
        submitter_reputation,
        direction,
        asset_type: content.asset_type,
        symbol: content.symbol.clone(),
        name: content.name.clone(),
        current_price: content.current_price,
        target_price: target,
        stop_loss: stop,
        confidence,
        community_score: community_score(rec.weighted_score),
        status: SignalStatus::Active,
        created_at: now,
        expires_at: now + content.time_horizon.signal_lifetime(),
        closed_at: None,
        subscribers: BTreeSet::new(),
        performance: None,
    })
}
