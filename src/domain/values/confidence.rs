use serde::{Deserialize, Serialize};
use std::fmt;

/// Signal confidence on a 0–100 scale.
/// Out-of-range values are rejected on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Upper bound for any derived confidence, boosts included.
    pub const CEILING: f64 = 95.0;

    pub fn new(value: f64) -> Result<Self, String> {
        if !(0.0..=100.0).contains(&value) {
            return Err(format!(
                "Confidence must be between 0 and 100, got {value}"
            ));
        }
        Ok(Confidence(value))
    }

    /// Confidence from an approval rate (0.0–1.0), capped at the ceiling.
    pub fn from_approval_rate(rate: f64) -> Self {
        Confidence((rate * 100.0).clamp(0.0, Self::CEILING))
    }

    /// Add a submitter reputation boost, never exceeding the ceiling.
    pub fn boosted_by_reputation(self, submitter_reputation: f64) -> Self {
        let boost = if submitter_reputation >= 80.0 {
            10.0
        } else if submitter_reputation >= 50.0 {
            5.0
        } else {
            0.0
        };
        Confidence((self.0 + boost).min(Self::CEILING))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Confidence::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> f64 {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}
