//! Keyed record store port with optimistic concurrency.
//!
//! Every entity the pipeline persists implements [`Record`]. Stores hand out
//! copies; a mutation is written back with [`RecordStore::compare_and_swap`],
//! which only succeeds when the stored version still equals the version the
//! caller read. Losing writers get [`DomainError::Conflict`] and re-read.

use crate::domain::error::DomainError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Table/namespace discriminator.
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);

    /// Lifecycle status used for filtering (e.g. "voting", "active").
    fn status_key(&self) -> &str;
    /// Owning user, when the record has one.
    fn owner_key(&self) -> Option<&str>;
    fn created_at(&self) -> DateTime<Utc>;
    fn expires_at(&self) -> Option<DateTime<Utc>> {
        None
    }
    /// Value used by [`SortOrder::HighestRank`].
    fn rank(&self) -> f64 {
        0.0
    }
    /// True while work triggered by a committed change is still outstanding.
    fn needs_follow_up(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Empty matches any status.
    pub statuses: Vec<String>,
    pub owner: Option<String>,
    pub since: Option<DateTime<Utc>>,
    /// Only records with an expiry at or before this instant.
    pub expires_before: Option<DateTime<Utc>>,
    pub needs_follow_up: Option<bool>,
}

impl RecordFilter {
    pub fn with_statuses<S: ToString>(statuses: impl IntoIterator<Item = S>) -> Self {
        Self {
            statuses: statuses.into_iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn matches<T: Record>(&self, record: &T) -> bool {
        if !self.statuses.is_empty() && !self.statuses.iter().any(|s| s == record.status_key()) {
            return false;
        }
        if let Some(owner) = &self.owner {
            if record.owner_key() != Some(owner.as_str()) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if record.created_at() < since {
                return false;
            }
        }
        if let Some(before) = self.expires_before {
            match record.expires_at() {
                Some(exp) if exp <= before => {}
                _ => return false,
            }
        }
        if let Some(wanted) = self.needs_follow_up {
            if record.needs_follow_up() != wanted {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    HighestRank,
}

impl SortOrder {
    pub fn sort<T: Record>(&self, records: &mut [T]) {
        match self {
            // ties break on id, matching the SQL adapters
            SortOrder::NewestFirst => {
                records.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then_with(|| a.id().cmp(b.id())))
            }
            SortOrder::OldestFirst => {
                records.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| a.id().cmp(b.id())))
            }
            SortOrder::HighestRank => {
                records.sort_by(|a, b| b.rank().total_cmp(&a.rank()).then_with(|| a.id().cmp(b.id())))
            }
        }
    }
}

/// Live view: each item is the full result set after a change.
pub type SnapshotStream<T> = BoxStream<'static, Result<Vec<T>, DomainError>>;

#[async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<T>, DomainError>;

    /// Insert a new record at version 1. Fails with `Conflict` if the id exists.
    async fn put(&self, record: &T) -> Result<T, DomainError>;

    /// Write `record` iff the stored version equals `record.version()`.
    /// Returns the stored copy with its bumped version.
    async fn compare_and_swap(&self, record: &T) -> Result<T, DomainError>;

    async fn query(
        &self,
        filter: &RecordFilter,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<T>, DomainError>;

    /// Lazy, unbounded stream of query snapshots. The first item reflects the
    /// current state; a new item follows every write to the store.
    fn subscribe(&self, filter: RecordFilter, order: SortOrder, limit: Option<usize>)
        -> SnapshotStream<T>;
}
