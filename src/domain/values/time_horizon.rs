use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeHorizon {
    Short,
    #[default]
    Medium,
    Long,
}

impl TimeHorizon {
    /// How long a signal derived from a call with this horizon stays active.
    pub fn signal_lifetime(&self) -> Duration {
        match self {
            TimeHorizon::Short => Duration::days(7),
            TimeHorizon::Medium => Duration::days(30),
            TimeHorizon::Long => Duration::days(90),
        }
    }
}

impl fmt::Display for TimeHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeHorizon::Short => write!(f, "short"),
            TimeHorizon::Medium => write!(f, "medium"),
            TimeHorizon::Long => write!(f, "long"),
        }
    }
}

impl FromStr for TimeHorizon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(TimeHorizon::Short),
            "medium" => Ok(TimeHorizon::Medium),
            "long" => Ok(TimeHorizon::Long),
            _ => Err(format!("Unknown time horizon: {s}")),
        }
    }
}
