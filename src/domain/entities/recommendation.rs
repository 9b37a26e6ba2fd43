use crate::domain::error::DomainError;
use crate::domain::ports::record_store::Record;
use crate::domain::values::asset_type::AssetType;
use crate::domain::values::risk_level::RiskLevel;
use crate::domain::values::signal_direction::SignalDirection;
use crate::domain::values::time_horizon::TimeHorizon;
use crate::domain::values::vetting_status::VettingStatus;
use crate::domain::values::vote_direction::VoteDirection;
use crate::domain::values::vote_weight::VoteWeight;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a recommendation stays open for votes.
pub const VOTING_WINDOW_DAYS: i64 = 7;
pub const APPROVAL_RATE: f64 = 0.70;
pub const APPROVAL_MIN_VOTERS: u64 = 10;
pub const REJECTION_RATE: f64 = 0.60;
pub const REJECTION_MIN_VOTERS: u64 = 5;

/// What the submitter is recommending. Immutable after submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecommendationContent {
    pub asset_type: AssetType,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub current_price: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub direction: SignalDirection,
    pub reasoning: String,
    pub target_price: Option<f64>,
    #[serde(default)]
    pub time_horizon: TimeHorizon,
    #[serde(default)]
    pub risk_level: RiskLevel,
    pub analysis: Option<String>,
}

impl RecommendationContent {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.reasoning.trim().is_empty() {
            return Err(DomainError::InvalidInput("reasoning must not be empty".into()));
        }
        if let Some(price) = self.current_price {
            if !price.is_finite() || price <= 0.0 {
                return Err(DomainError::InvalidInput(format!(
                    "current price must be positive, got {price}"
                )));
            }
        }
        if let Some(target) = self.target_price {
            if !target.is_finite() || target <= 0.0 {
                return Err(DomainError::InvalidInput(format!(
                    "target price must be positive, got {target}"
                )));
            }
        }
        if matches!(self.asset_type, AssetType::Stock | AssetType::Crypto) && self.symbol.is_none() {
            return Err(DomainError::InvalidInput(format!(
                "{} recommendations need a symbol",
                self.asset_type
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoterRecord {
    pub voter_id: String,
    pub direction: VoteDirection,
    /// Voter reputation when the vote was cast.
    pub voter_reputation: f64,
    pub weight: VoteWeight,
    pub voted_at: DateTime<Utc>,
    pub comment: Option<String>,
}

impl VoterRecord {
    pub fn signed_weight(&self) -> f64 {
        self.direction.sign() * self.weight.value()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recommendation {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    pub submitter_id: String,
    pub submitter_name: String,
    /// Copy of the submitter's score at submission time.
    pub submitter_reputation: f64,
    pub content: RecommendationContent,
    pub upvotes: u64,
    pub downvotes: u64,
    pub total_voters: u64,
    pub weighted_score: f64,
    pub voters: Vec<VoterRecord>,
    pub status: VettingStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Set once, when the approval is claimed for signal synthesis.
    pub signal_id: Option<String>,
    pub signal_claimed_at: Option<DateTime<Utc>>,
    /// Set once the submitter has been credited with the outcome and, for an
    /// approval, the signal exists.
    #[serde(default)]
    pub settled_at: Option<DateTime<Utc>>,
}

impl Recommendation {
    pub fn new(
        submitter_id: String,
        submitter_name: String,
        submitter_reputation: f64,
        content: RecommendationContent,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            version: 0,
            submitter_id,
            submitter_name,
            submitter_reputation,
            content,
            upvotes: 0,
            downvotes: 0,
            total_voters: 0,
            weighted_score: 0.0,
            voters: Vec::new(),
            status: VettingStatus::Pending,
            created_at: now,
            expires_at: now + Duration::days(VOTING_WINDOW_DAYS),
            resolved_at: None,
            signal_id: None,
            signal_claimed_at: None,
            settled_at: None,
        }
    }

    pub fn has_voted(&self, voter_id: &str) -> bool {
        self.voters.iter().any(|v| v.voter_id == voter_id)
    }

    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn approval_rate(&self) -> f64 {
        let cast = self.upvotes + self.downvotes;
        if cast == 0 {
            0.0
        } else {
            self.upvotes as f64 / cast as f64
        }
    }

    pub fn rejection_rate(&self) -> f64 {
        let cast = self.upvotes + self.downvotes;
        if cast == 0 {
            0.0
        } else {
            self.downvotes as f64 / cast as f64
        }
    }

    /// Apply one vote and evaluate the resolution thresholds.
    ///
    /// Returns the terminal status reached by this vote, if any. On error the
    /// recommendation is left untouched.
    pub fn apply_vote(
        &mut self,
        voter_id: &str,
        direction: VoteDirection,
        voter_reputation: f64,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<VettingStatus>, DomainError> {
        if self.status.is_terminal() || self.is_past_expiry(now) {
            return Err(DomainError::NotVotable(self.id.clone()));
        }
        if self.has_voted(voter_id) {
            return Err(DomainError::DuplicateVote {
                recommendation_id: self.id.clone(),
                voter_id: voter_id.to_string(),
            });
        }

        let record = VoterRecord {
            voter_id: voter_id.to_string(),
            direction,
            voter_reputation,
            weight: VoteWeight::for_reputation(voter_reputation),
            voted_at: now,
            comment,
        };

        match direction {
            VoteDirection::Up => self.upvotes += 1,
            VoteDirection::Down => self.downvotes += 1,
        }
        self.total_voters += 1;
        self.weighted_score += record.signed_weight();
        self.voters.push(record);
        self.status = VettingStatus::Voting;

        Ok(self.evaluate_thresholds(now))
    }

    /// Approve/reject check, run after every vote. Approval wins ties.
    pub fn evaluate_thresholds(&mut self, now: DateTime<Utc>) -> Option<VettingStatus> {
        if self.status.is_terminal() {
            return None;
        }
        let outcome = if self.approval_rate() >= APPROVAL_RATE
            && self.total_voters >= APPROVAL_MIN_VOTERS
            && self.weighted_score > 0.0
        {
            Some(VettingStatus::Approved)
        } else if self.rejection_rate() >= REJECTION_RATE && self.total_voters >= REJECTION_MIN_VOTERS {
            Some(VettingStatus::Rejected)
        } else {
            None
        };

        if let Some(status) = outcome {
            self.status = status;
            self.resolved_at = Some(now);
        }
        outcome
    }

    /// Move an open, past-expiry recommendation to `Expired`.
    /// Returns false when there is nothing to do.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() || !self.is_past_expiry(now) {
            return false;
        }
        self.status = VettingStatus::Expired;
        self.resolved_at = Some(now);
        true
    }

    /// Claim the one-time conversion of this approval into a signal.
    pub fn claim_signal(&mut self, signal_id: String, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != VettingStatus::Approved {
            return Err(DomainError::InvalidTransition(format!(
                "recommendation {} is {}, only approved recommendations convert",
                self.id, self.status
            )));
        }
        if self.signal_id.is_some() {
            return Err(DomainError::AlreadyConverted(self.id.clone()));
        }
        self.signal_id = Some(signal_id);
        self.signal_claimed_at = Some(now);
        Ok(())
    }

    /// Outcome to credit to the submitter: `Some(approved)` once approved or
    /// rejected, `None` while open or after expiry.
    pub fn credited_outcome(&self) -> Option<bool> {
        match self.status {
            VettingStatus::Approved => Some(true),
            VettingStatus::Rejected => Some(false),
            _ => None,
        }
    }

    /// Record that every follow-up of the resolution is done.
    /// Returns false when there is nothing to do.
    pub fn mark_settled(&mut self, now: DateTime<Utc>) -> bool {
        if !self.status.is_terminal() || self.settled_at.is_some() {
            return false;
        }
        self.settled_at = Some(now);
        true
    }

    /// Sum of signed weights over the recorded voters.
    pub fn recomputed_weighted_score(&self) -> f64 {
        self.voters.iter().map(VoterRecord::signed_weight).sum()
    }
}

impl Record for Recommendation {
    const KIND: &'static str = "recommendation";

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn status_key(&self) -> &str {
        self.status.as_str()
    }

    fn owner_key(&self) -> Option<&str> {
        Some(&self.submitter_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        Some(self.expires_at)
    }

    fn rank(&self) -> f64 {
        self.weighted_score
    }

    fn needs_follow_up(&self) -> bool {
        self.status.is_terminal() && self.settled_at.is_none()
    }
}
