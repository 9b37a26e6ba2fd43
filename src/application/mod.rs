pub mod reputation;
pub mod retry;
pub mod signals;
pub mod sweep;
pub mod vetting;
