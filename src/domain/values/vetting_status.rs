use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a recommendation under community review.
///
/// `Pending` (no votes yet) and `Voting` both accept votes; the other
/// three states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VettingStatus {
    Pending,
    Voting,
    Approved,
    Rejected,
    Expired,
}

impl VettingStatus {
    pub const OPEN: [VettingStatus; 2] = [VettingStatus::Pending, VettingStatus::Voting];

    pub fn is_open(&self) -> bool {
        matches!(self, VettingStatus::Pending | VettingStatus::Voting)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VettingStatus::Pending => "pending",
            VettingStatus::Voting => "voting",
            VettingStatus::Approved => "approved",
            VettingStatus::Rejected => "rejected",
            VettingStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for VettingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VettingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(VettingStatus::Pending),
            "voting" => Ok(VettingStatus::Voting),
            "approved" => Ok(VettingStatus::Approved),
            "rejected" => Ok(VettingStatus::Rejected),
            "expired" => Ok(VettingStatus::Expired),
            _ => Err(format!("Unknown vetting status: {s}")),
        }
    }
}
