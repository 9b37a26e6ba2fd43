use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Directional call carried from a recommendation into its signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalDirection {
    Buy,
    Sell,
    Hold,
    Watch,
}

impl SignalDirection {
    /// Only buy and sell calls carry stop-loss and target levels.
    pub fn is_directional(&self) -> bool {
        matches!(self, SignalDirection::Buy | SignalDirection::Sell)
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalDirection::Buy => write!(f, "buy"),
            SignalDirection::Sell => write!(f, "sell"),
            SignalDirection::Hold => write!(f, "hold"),
            SignalDirection::Watch => write!(f, "watch"),
        }
    }
}

impl FromStr for SignalDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(SignalDirection::Buy),
            "sell" => Ok(SignalDirection::Sell),
            "hold" => Ok(SignalDirection::Hold),
            "watch" => Ok(SignalDirection::Watch),
            _ => Err(format!("Unknown signal direction: {s}")),
        }
    }
}
