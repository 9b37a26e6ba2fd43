use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Active,
    Triggered,
    Expired,
    Cancelled,
}

impl SignalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SignalStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Active => "active",
            SignalStatus::Triggered => "triggered",
            SignalStatus::Expired => "expired",
            SignalStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SignalStatus::Active),
            "triggered" => Ok(SignalStatus::Triggered),
            "expired" => Ok(SignalStatus::Expired),
            "cancelled" | "canceled" => Ok(SignalStatus::Cancelled),
            _ => Err(format!("Unknown signal status: {s}")),
        }
    }
}
