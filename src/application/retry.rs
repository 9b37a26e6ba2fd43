//! Read-modify-write against a [`RecordStore`] with bounded conflict retry.

use crate::domain::error::DomainError;
use crate::domain::ports::record_store::{Record, RecordStore};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Sleep `backoff * attempt` before re-reading after a conflict.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 16,
            backoff: Duration::from_millis(1),
        }
    }
}

impl RetryPolicy {
    async fn pause(&self, attempt: u32) {
        if self.backoff.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.backoff * attempt).await;
        }
    }
}

/// Read `id`, apply `mutate` to a copy and compare-and-swap it back.
///
/// `mutate` re-runs on the fresh record after every conflict. Any error it
/// returns aborts the update with nothing written. Returns the stored record
/// and the mutator's output from the attempt that won.
pub async fn update_with_retry<T, R, F>(
    store: &dyn RecordStore<T>,
    id: &str,
    policy: RetryPolicy,
    mut mutate: F,
) -> Result<(T, R), DomainError>
where
    T: Record,
    F: FnMut(&mut T) -> Result<R, DomainError> + Send,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        let mut record = store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("{} {id}", T::KIND)))?;
        let out = mutate(&mut record)?;
        match store.compare_and_swap(&record).await {
            Ok(stored) => return Ok((stored, out)),
            Err(e) if e.is_conflict() => {
                tracing::debug!(kind = T::KIND, %id, attempt, "write conflict, retrying");
                policy.pause(attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
    tracing::warn!(kind = T::KIND, %id, attempts, "write conflict retries exhausted");
    Err(DomainError::Conflict(format!("{} {id}", T::KIND)))
}

/// Like [`update_with_retry`], but `mutate` may return `Ok(None)` to signal
/// that nothing changed. In that case no write happens, so the version stays
/// put and subscribers are not woken. Returns the record as read.
pub async fn update_if_changed<T, R, F>(
    store: &dyn RecordStore<T>,
    id: &str,
    policy: RetryPolicy,
    mut mutate: F,
) -> Result<(T, Option<R>), DomainError>
where
    T: Record,
    F: FnMut(&mut T) -> Result<Option<R>, DomainError> + Send,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        let current = store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("{} {id}", T::KIND)))?;
        let mut record = current.clone();
        let out = match mutate(&mut record)? {
            Some(out) => out,
            None => return Ok((current, None)),
        };
        match store.compare_and_swap(&record).await {
            Ok(stored) => return Ok((stored, Some(out))),
            Err(e) if e.is_conflict() => {
                tracing::debug!(kind = T::KIND, %id, attempt, "write conflict, retrying");
                policy.pause(attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
    tracing::warn!(kind = T::KIND, %id, attempts, "write conflict retries exhausted");
    Err(DomainError::Conflict(format!("{} {id}", T::KIND)))
}

/// Like [`update_with_retry`], but creates the record with `init` when absent.
pub async fn upsert_with_retry<T, R, I, F>(
    store: &dyn RecordStore<T>,
    id: &str,
    policy: RetryPolicy,
    init: I,
    mut mutate: F,
) -> Result<(T, R), DomainError>
where
    T: Record,
    I: Fn() -> T + Send,
    F: FnMut(&mut T) -> Result<R, DomainError> + Send,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        let existing = store.get(id).await?;
        let is_new = existing.is_none();
        let mut record = existing.unwrap_or_else(&init);
        let out = mutate(&mut record)?;

        let written = if is_new {
            store.put(&record).await
        } else {
            store.compare_and_swap(&record).await
        };
        match written {
            Ok(stored) => return Ok((stored, out)),
            // a racing writer created or changed the record; start over
            Err(e) if e.is_conflict() => {
                tracing::debug!(kind = T::KIND, %id, attempt, "write conflict, retrying");
                policy.pause(attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
    tracing::warn!(kind = T::KIND, %id, attempts, "write conflict retries exhausted");
    Err(DomainError::Conflict(format!("{} {id}", T::KIND)))
}
