use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Voter {voter_id} already voted on {recommendation_id}")]
    DuplicateVote {
        recommendation_id: String,
        voter_id: String,
    },

    #[error("Recommendation {0} is closed for voting")]
    NotVotable(String),

    #[error("User {user_id} is already subscribed to signal {signal_id}")]
    AlreadySubscribed { signal_id: String, user_id: String },

    #[error("Write conflict on {0}")]
    Conflict(String),

    #[error("Recommendation {0} was already converted to a signal")]
    AlreadyConverted(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::Conflict(_))
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Parse(e.to_string())
    }
}
