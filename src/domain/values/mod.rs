pub mod asset_type;
pub mod badge;
pub mod confidence;
pub mod reputation_level;
pub mod risk_level;
pub mod signal_direction;
pub mod signal_status;
pub mod time_horizon;
pub mod vetting_status;
pub mod vote_direction;
pub mod vote_weight;
