use crate::domain::error::DomainError;
use crate::domain::ports::record_store::{Record, RecordFilter, RecordStore, SnapshotStream, SortOrder};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

/// In-process store. Versions are checked under the write lock, so it has the
/// same conflict semantics as the SQLite adapter.
pub struct MemoryStore<T: Record> {
    records: Arc<RwLock<HashMap<String, T>>>,
    changes: watch::Sender<u64>,
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> MemoryStore<T> {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            changes,
        }
    }

    fn snapshot(
        records: &RwLock<HashMap<String, T>>,
        filter: &RecordFilter,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<T>, DomainError> {
        let map = records
            .read()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut out: Vec<T> = map.values().filter(|r| filter.matches(*r)).cloned().collect();
        order.sort(&mut out);
        if let Some(limit) = limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    fn bump(&self) {
        self.changes.send_modify(|v| *v += 1);
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for MemoryStore<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, DomainError> {
        let map = self
            .records
            .read()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(map.get(id).cloned())
    }

    async fn put(&self, record: &T) -> Result<T, DomainError> {
        let stored = {
            let mut map = self
                .records
                .write()
                .map_err(|e| DomainError::Database(e.to_string()))?;
            if map.contains_key(record.id()) {
                return Err(DomainError::Conflict(format!("{} {} already exists", T::KIND, record.id())));
            }
            let mut stored = record.clone();
            stored.set_version(1);
            map.insert(stored.id().to_string(), stored.clone());
            stored
        };
        self.bump();
        Ok(stored)
    }

    async fn compare_and_swap(&self, record: &T) -> Result<T, DomainError> {
        let stored = {
            let mut map = self
                .records
                .write()
                .map_err(|e| DomainError::Database(e.to_string()))?;
            let current = map
                .get(record.id())
                .ok_or_else(|| DomainError::NotFound(format!("{} {}", T::KIND, record.id())))?;
            if current.version() != record.version() {
                return Err(DomainError::Conflict(format!("{} {}", T::KIND, record.id())));
            }
            let mut stored = record.clone();
            stored.set_version(record.version() + 1);
            map.insert(stored.id().to_string(), stored.clone());
            stored
        };
        self.bump();
        Ok(stored)
    }

    async fn query(
        &self,
        filter: &RecordFilter,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<T>, DomainError> {
        Self::snapshot(&self.records, filter, order, limit)
    }

    fn subscribe(&self, filter: RecordFilter, order: SortOrder, limit: Option<usize>) -> SnapshotStream<T> {
        let records = self.records.clone();
        let rx = self.changes.subscribe();
        stream::unfold((records, rx, filter, true), move |(records, mut rx, filter, first)| async move {
            if first {
                rx.borrow_and_update();
            } else if rx.changed().await.is_err() {
                return None;
            }
            let snap = Self::snapshot(&records, &filter, order, limit);
            Some((snap, (records, rx, filter, false)))
        })
        .boxed()
    }
}
