use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Contributor tier derived from the reputation score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReputationLevel {
    #[default]
    Novice,
    Intermediate,
    Expert,
    Master,
}

impl ReputationLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 200.0 {
            ReputationLevel::Novice
        } else if score < 500.0 {
            ReputationLevel::Intermediate
        } else if score < 800.0 {
            ReputationLevel::Expert
        } else {
            ReputationLevel::Master
        }
    }
}

impl fmt::Display for ReputationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReputationLevel::Novice => write!(f, "novice"),
            ReputationLevel::Intermediate => write!(f, "intermediate"),
            ReputationLevel::Expert => write!(f, "expert"),
            ReputationLevel::Master => write!(f, "master"),
        }
    }
}

impl FromStr for ReputationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "novice" => Ok(ReputationLevel::Novice),
            "intermediate" => Ok(ReputationLevel::Intermediate),
            "expert" => Ok(ReputationLevel::Expert),
            "master" => Ok(ReputationLevel::Master),
            _ => Err(format!("Unknown reputation level: {s}")),
        }
    }
}
