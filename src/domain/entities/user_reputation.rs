use crate::domain::events::DomainEvent;
use crate::domain::ports::record_store::Record;
use crate::domain::values::badge::{achievements_for, badges_for, Achievement, Badge};
use crate::domain::values::reputation_level::ReputationLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const MAX_SCORE: f64 = 1000.0;

/// Raw counters. Everything else on [`UserReputation`] derives from these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReputationCounters {
    pub total_recommendations: u64,
    pub approved: u64,
    pub rejected: u64,
    pub total_votes_received: u64,
    pub helpful_votes: u64,
    pub followers: u64,
}

impl ReputationCounters {
    pub fn accuracy_rate(&self) -> f64 {
        if self.total_recommendations == 0 {
            0.0
        } else {
            self.approved as f64 / self.total_recommendations as f64
        }
    }

    /// `min(1000, 5A + 20·(A/T) + 0.5V + 2H + 0.1F)`
    pub fn score(&self) -> f64 {
        let raw = 5.0 * self.approved as f64
            + 20.0 * self.accuracy_rate()
            + 0.5 * self.total_votes_received as f64
            + 2.0 * self.helpful_votes as f64
            + 0.1 * self.followers as f64;
        raw.min(MAX_SCORE)
    }
}

/// What one of the user's recommendations has contributed to the counters so
/// far. Crediting the same tallies again adds nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecommendationCredit {
    pub votes: u64,
    pub helpful: u64,
    #[serde(default)]
    pub outcome: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserReputation {
    pub user_id: String,
    #[serde(default)]
    pub version: u64,
    pub counters: ReputationCounters,
    pub accuracy_rate: f64,
    pub score: f64,
    pub level: ReputationLevel,
    pub badges: BTreeSet<Badge>,
    pub achievements: BTreeSet<Achievement>,
    /// Keyed by recommendation id.
    #[serde(default)]
    pub credited: BTreeMap<String, RecommendationCredit>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserReputation {
    pub fn new(user_id: String, now: DateTime<Utc>) -> Self {
        let mut rep = Self {
            user_id,
            version: 0,
            counters: ReputationCounters::default(),
            accuracy_rate: 0.0,
            score: 0.0,
            level: ReputationLevel::Novice,
            badges: BTreeSet::new(),
            achievements: BTreeSet::new(),
            credited: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        };
        rep.recompute();
        rep
    }

    /// Rebuild every derived field from the counters.
    pub fn recompute(&mut self) {
        let c = self.counters;
        self.accuracy_rate = c.accuracy_rate();
        self.score = c.score();
        self.level = ReputationLevel::from_score(self.score);
        self.badges = badges_for(
            c.total_recommendations,
            self.accuracy_rate,
            c.total_votes_received,
            c.helpful_votes,
            c.followers,
        );
        self.achievements = achievements_for(c.total_recommendations, c.approved, c.followers, self.level);
    }

    /// Apply a counter change, recompute, and report what newly changed.
    pub fn update<F>(&mut self, now: DateTime<Utc>, change: F) -> Vec<DomainEvent>
    where
        F: FnOnce(&mut ReputationCounters),
    {
        let prev_level = self.level;
        let prev_badges = self.badges.clone();
        let prev_achievements = self.achievements.clone();

        change(&mut self.counters);
        self.recompute();
        self.updated_at = now;

        let mut events = Vec::new();
        if self.level > prev_level {
            events.push(DomainEvent::LevelUp {
                user_id: self.user_id.clone(),
                new_level: self.level,
            });
        }
        for badge in self.badges.difference(&prev_badges) {
            events.push(DomainEvent::BadgeEarned {
                user_id: self.user_id.clone(),
                badge: *badge,
            });
        }
        for achievement in self.achievements.difference(&prev_achievements) {
            events.push(DomainEvent::AchievementUnlocked {
                user_id: self.user_id.clone(),
                achievement: *achievement,
            });
        }
        events
    }

    pub fn record_outcome(&mut self, was_approved: bool, now: DateTime<Utc>) -> Vec<DomainEvent> {
        self.update(now, |c| {
            c.total_recommendations += 1;
            if was_approved {
                c.approved += 1;
            } else {
                c.rejected += 1;
            }
        })
    }

    pub fn record_vote_received(&mut self, was_helpful: bool, now: DateTime<Utc>) -> Vec<DomainEvent> {
        self.update(now, |c| {
            c.total_votes_received += 1;
            if was_helpful {
                c.helpful_votes += 1;
            }
        })
    }

    /// Bring the counters up to date with one recommendation's tallies.
    ///
    /// Only the part not yet credited is applied, so repeating a call, or
    /// applying an older tally after a newer one, changes nothing.
    pub fn credit_recommendation(
        &mut self,
        recommendation_id: &str,
        votes: u64,
        helpful: u64,
        outcome: Option<bool>,
        now: DateTime<Utc>,
    ) -> Vec<DomainEvent> {
        let prior = self.credited.get(recommendation_id).copied().unwrap_or_default();
        let new_votes = votes.saturating_sub(prior.votes);
        let new_helpful = helpful.saturating_sub(prior.helpful);
        let new_outcome = match (prior.outcome, outcome) {
            (None, Some(approved)) => Some(approved),
            _ => None,
        };
        if new_votes == 0 && new_helpful == 0 && new_outcome.is_none() {
            return Vec::new();
        }

        self.credited.insert(
            recommendation_id.to_string(),
            RecommendationCredit {
                votes: prior.votes.max(votes),
                helpful: prior.helpful.max(helpful),
                outcome: prior.outcome.or(outcome),
            },
        );
        self.update(now, |c| {
            c.total_votes_received += new_votes;
            c.helpful_votes += new_helpful;
            if let Some(approved) = new_outcome {
                c.total_recommendations += 1;
                if approved {
                    c.approved += 1;
                } else {
                    c.rejected += 1;
                }
            }
        })
    }

    pub fn record_follower_change(&mut self, delta: i64, now: DateTime<Utc>) -> Vec<DomainEvent> {
        self.update(now, |c| {
            c.followers = if delta >= 0 {
                c.followers.saturating_add(delta as u64)
            } else {
                c.followers.saturating_sub(delta.unsigned_abs())
            };
        })
    }
}

impl Record for UserReputation {
    const KIND: &'static str = "user_reputation";

    fn id(&self) -> &str {
        &self.user_id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn status_key(&self) -> &str {
        match self.level {
            ReputationLevel::Novice => "novice",
            ReputationLevel::Intermediate => "intermediate",
            ReputationLevel::Expert => "expert",
            ReputationLevel::Master => "master",
        }
    }

    fn owner_key(&self) -> Option<&str> {
        Some(&self.user_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn rank(&self) -> f64 {
        self.score
    }
}
