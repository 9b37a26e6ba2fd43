pub mod broadcast;
pub mod noop;
pub mod tracing_notifier;
