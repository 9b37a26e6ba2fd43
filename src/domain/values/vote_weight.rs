use serde::{Deserialize, Serialize};

/// Multiplier applied to a vote, fixed from the voter's reputation at vote time.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct VoteWeight(f64);

impl VoteWeight {
    pub fn for_reputation(reputation: f64) -> Self {
        let w = if reputation >= 100.0 {
            3.0
        } else if reputation >= 50.0 {
            2.0
        } else if reputation >= 20.0 {
            1.5
        } else {
            1.0
        };
        VoteWeight(w)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}
