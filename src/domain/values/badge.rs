//! Badges and achievements are derived flags over reputation counters.
//!
//! Both sets are recomputed from scratch on every ledger update, so they can
//! never drift from the counters they describe.

use super::reputation_level::ReputationLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Accuracy badges need a minimum sample before they can be earned.
pub const ACCURACY_BADGE_MIN_RECOMMENDATIONS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    /// 10+ recommendations submitted
    Contributor,
    /// 50+ recommendations submitted
    Prolific,
    /// 100+ recommendations submitted
    Veteran,
    /// accuracy >= 0.7
    Accurate,
    /// accuracy >= 0.8
    Sharpshooter,
    /// accuracy >= 0.9
    Oracle,
    /// 100+ votes received
    CommunityVoice,
    /// 50+ helpful votes
    Helpful,
    /// 25+ followers
    Influencer,
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Badge::Contributor => "contributor",
            Badge::Prolific => "prolific",
            Badge::Veteran => "veteran",
            Badge::Accurate => "accurate",
            Badge::Sharpshooter => "sharpshooter",
            Badge::Oracle => "oracle",
            Badge::CommunityVoice => "community_voice",
            Badge::Helpful => "helpful",
            Badge::Influencer => "influencer",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstRecommendation,
    FirstApproval,
    TenApprovals,
    FiftyApprovals,
    FirstFollower,
    ReachedExpert,
    ReachedMaster,
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Achievement::FirstRecommendation => "first_recommendation",
            Achievement::FirstApproval => "first_approval",
            Achievement::TenApprovals => "ten_approvals",
            Achievement::FiftyApprovals => "fifty_approvals",
            Achievement::FirstFollower => "first_follower",
            Achievement::ReachedExpert => "reached_expert",
            Achievement::ReachedMaster => "reached_master",
        };
        f.write_str(s)
    }
}

pub fn badges_for(
    total_recommendations: u64,
    accuracy_rate: f64,
    total_votes_received: u64,
    helpful_votes: u64,
    followers: u64,
) -> BTreeSet<Badge> {
    let mut badges = BTreeSet::new();

    if total_recommendations >= 10 {
        badges.insert(Badge::Contributor);
    }
    if total_recommendations >= 50 {
        badges.insert(Badge::Prolific);
    }
    if total_recommendations >= 100 {
        badges.insert(Badge::Veteran);
    }

    if total_recommendations >= ACCURACY_BADGE_MIN_RECOMMENDATIONS {
        if accuracy_rate >= 0.7 {
            badges.insert(Badge::Accurate);
        }
        if accuracy_rate >= 0.8 {
            badges.insert(Badge::Sharpshooter);
        }
        if accuracy_rate >= 0.9 {
            badges.insert(Badge::Oracle);
        }
    }

    if total_votes_received >= 100 {
        badges.insert(Badge::CommunityVoice);
    }
    if helpful_votes >= 50 {
        badges.insert(Badge::Helpful);
    }
    if followers >= 25 {
        badges.insert(Badge::Influencer);
    }

    badges
}

pub fn achievements_for(
    total_recommendations: u64,
    approved: u64,
    followers: u64,
    level: ReputationLevel,
) -> BTreeSet<Achievement> {
    let mut achievements = BTreeSet::new();

    if total_recommendations >= 1 {
        achievements.insert(Achievement::FirstRecommendation);
    }
    if approved >= 1 {
        achievements.insert(Achievement::FirstApproval);
    }
    if approved >= 10 {
        achievements.insert(Achievement::TenApprovals);
    }
    if approved >= 50 {
        achievements.insert(Achievement::FiftyApprovals);
    }
    if followers >= 1 {
        achievements.insert(Achievement::FirstFollower);
    }
    if level >= ReputationLevel::Expert {
        achievements.insert(Achievement::ReachedExpert);
    }
    if level == ReputationLevel::Master {
        achievements.insert(Achievement::ReachedMaster);
    }

    achievements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_badges_stack() {
        let badges = badges_for(100, 0.0, 0, 0, 0);
        assert!(badges.contains(&Badge::Contributor));
        assert!(badges.contains(&Badge::Prolific));
        assert!(badges.contains(&Badge::Veteran));
        assert!(!badges.contains(&Badge::Accurate));
    }

    #[test]
    fn test_accuracy_badges_need_sample() {
        assert!(badges_for(3, 1.0, 0, 0, 0).is_empty());

        let badges = badges_for(10, 0.85, 0, 0, 0);
        assert!(badges.contains(&Badge::Accurate));
        assert!(badges.contains(&Badge::Sharpshooter));
        assert!(!badges.contains(&Badge::Oracle));
    }

    #[test]
    fn test_engagement_badges() {
        let badges = badges_for(0, 0.0, 100, 50, 25);
        assert_eq!(
            badges.into_iter().collect::<Vec<_>>(),
            vec![Badge::CommunityVoice, Badge::Helpful, Badge::Influencer]
        );
        assert!(badges_for(0, 0.0, 99, 49, 24).is_empty());
    }

    #[test]
    fn test_achievements_follow_level() {
        let a = achievements_for(20, 20, 0, ReputationLevel::Intermediate);
        assert!(a.contains(&Achievement::FirstRecommendation));
        assert!(a.contains(&Achievement::TenApprovals));
        assert!(!a.contains(&Achievement::ReachedExpert));

        let a = achievements_for(0, 0, 0, ReputationLevel::Master);
        assert!(a.contains(&Achievement::ReachedExpert));
        assert!(a.contains(&Achievement::ReachedMaster));
    }
}
