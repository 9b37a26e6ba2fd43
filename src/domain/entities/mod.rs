pub mod recommendation;
pub mod trading_signal;
pub mod user_reputation;
