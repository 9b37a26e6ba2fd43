pub mod clock;
pub mod notifier;
pub mod record_store;
