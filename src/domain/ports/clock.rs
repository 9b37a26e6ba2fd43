use chrono::{DateTime, Utc};

/// Time source for every timestamp the pipeline writes.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
