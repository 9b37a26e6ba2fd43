use crate::domain::values::badge::{Achievement, Badge};
use crate::domain::values::reputation_level::ReputationLevel;
use crate::domain::values::signal_status::SignalStatus;
use crate::domain::values::vetting_status::VettingStatus;
use serde::Serialize;

/// Side-channel notifications emitted by the pipeline for alerting and UI consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    RecommendationResolved {
        id: String,
        outcome: VettingStatus,
    },
    LevelUp {
        user_id: String,
        new_level: ReputationLevel,
    },
    BadgeEarned {
        user_id: String,
        badge: Badge,
    },
    AchievementUnlocked {
        user_id: String,
        achievement: Achievement,
    },
    SignalCreated {
        id: String,
        source_recommendation_id: String,
    },
    SignalStatusChanged {
        id: String,
        new_status: SignalStatus,
    },
}

impl DomainEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::RecommendationResolved { .. } => "recommendation_resolved",
            DomainEvent::LevelUp { .. } => "level_up",
            DomainEvent::BadgeEarned { .. } => "badge_earned",
            DomainEvent::AchievementUnlocked { .. } => "achievement_unlocked",
            DomainEvent::SignalCreated { .. } => "signal_created",
            DomainEvent::SignalStatusChanged { .. } => "signal_status_changed",
        }
    }
}
