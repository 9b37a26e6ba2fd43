use crate::domain::error::DomainError;
use crate::domain::ports::record_store::{Record, RecordFilter, RecordStore, SnapshotStream, SortOrder};
use crate::infrastructure::sqlite::migrations::run_migrations;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::stream::{self, StreamExt};
use rusqlite::{params, Connection, ErrorCode};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Document store over a single `records` table. Each record kind shares the
/// table, keyed by `(kind, id)`; the full record lives in `body` as JSON and
/// the filterable fields are copied into indexed columns on every write.
pub struct SqliteStore<T: Record> {
    conn: Arc<Mutex<Connection>>,
    changes: watch::Sender<u64>,
    _kind: PhantomData<fn() -> T>,
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation)
}

impl<T: Record> SqliteStore<T> {
    pub fn new(conn: Connection) -> Result<Self, DomainError> {
        run_migrations(&conn)?;
        let (changes, _) = watch::channel(0);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            changes,
            _kind: PhantomData,
        })
    }

    pub fn open(db_path: &str) -> Result<Self, DomainError> {
        let conn = Connection::open(db_path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
        if db_path != ":memory:" {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
        }
        Self::new(conn)
    }

    fn decode(body: &str, version: i64) -> Result<T, DomainError> {
        let mut record: T = serde_json::from_str(body)
            .map_err(|e| DomainError::Parse(format!("Malformed {} record: {e}", T::KIND)))?;
        record.set_version(version as u64);
        Ok(record)
    }

    fn select(
        conn: &Mutex<Connection>,
        filter: &RecordFilter,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<T>, DomainError> {
        let conn = conn.lock().map_err(|e| DomainError::Database(e.to_string()))?;

        let mut sql = String::from("SELECT body, version FROM records WHERE kind = ?1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(T::KIND)];

        if !filter.statuses.is_empty() {
            let placeholders: Vec<String> = filter
                .statuses
                .iter()
                .enumerate()
                .map(|(i, _)| format!("?{}", param_values.len() + i + 1))
                .collect();
            sql.push_str(&format!(" AND status IN ({})", placeholders.join(", ")));
            for status in &filter.statuses {
                param_values.push(Box::new(status.clone()));
            }
        }
        if let Some(owner) = &filter.owner {
            sql.push_str(&format!(" AND owner = ?{}", param_values.len() + 1));
            param_values.push(Box::new(owner.clone()));
        }
        if let Some(since) = filter.since {
            sql.push_str(&format!(" AND created_at >= ?{}", param_values.len() + 1));
            param_values.push(Box::new(ts(since)));
        }
        if let Some(before) = filter.expires_before {
            sql.push_str(&format!(
                " AND expires_at IS NOT NULL AND expires_at <= ?{}",
                param_values.len() + 1
            ));
            param_values.push(Box::new(ts(before)));
        }
        if let Some(wanted) = filter.needs_follow_up {
            sql.push_str(&format!(" AND follow_up = ?{}", param_values.len() + 1));
            param_values.push(Box::new(wanted));
        }
        sql.push_str(match order {
            SortOrder::NewestFirst => " ORDER BY created_at DESC, id",
            SortOrder::OldestFirst => " ORDER BY created_at ASC, id",
            SortOrder::HighestRank => " ORDER BY rank DESC, id",
        });
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT ?{}", param_values.len() + 1));
            param_values.push(Box::new(limit as i64));
        }

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (body, version) = row?;
            out.push(Self::decode(&body, version)?);
        }
        Ok(out)
    }

    fn bump(&self) {
        self.changes.send_modify(|v| *v += 1);
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for SqliteStore<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn.prepare("SELECT body, version FROM records WHERE kind = ?1 AND id = ?2")?;
        let mut rows = stmt.query(params![T::KIND, id])?;
        match rows.next()? {
            Some(row) => {
                let body: String = row.get(0)?;
                let version: i64 = row.get(1)?;
                Ok(Some(Self::decode(&body, version)?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, record: &T) -> Result<T, DomainError> {
        let mut stored = record.clone();
        stored.set_version(1);
        let body = serde_json::to_string(&stored)?;
        {
            let conn = self
                .conn
                .lock()
                .map_err(|e| DomainError::Database(e.to_string()))?;
            conn.execute(
                "INSERT INTO records (kind, id, version, status, owner, created_at, expires_at, rank, follow_up, body, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    T::KIND,
                    stored.id(),
                    1_i64,
                    stored.status_key(),
                    stored.owner_key(),
                    ts(stored.created_at()),
                    stored.expires_at().map(ts),
                    stored.rank(),
                    stored.needs_follow_up(),
                    body,
                    ts(Utc::now()),
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    DomainError::Conflict(format!("{} {} already exists", T::KIND, stored.id()))
                } else {
                    DomainError::Database(format!("Failed to insert {}: {e}", T::KIND))
                }
            })?;
        }
        self.bump();
        Ok(stored)
    }

    async fn compare_and_swap(&self, record: &T) -> Result<T, DomainError> {
        let expected = record.version();
        let mut stored = record.clone();
        stored.set_version(expected + 1);
        let body = serde_json::to_string(&stored)?;
        {
            let conn = self
                .conn
                .lock()
                .map_err(|e| DomainError::Database(e.to_string()))?;
            let rows = conn
                .execute(
                    "UPDATE records SET version = ?1, status = ?2, owner = ?3, expires_at = ?4, rank = ?5, follow_up = ?6, body = ?7, updated_at = ?8
                     WHERE kind = ?9 AND id = ?10 AND version = ?11",
                    params![
                        (expected + 1) as i64,
                        stored.status_key(),
                        stored.owner_key(),
                        stored.expires_at().map(ts),
                        stored.rank(),
                        stored.needs_follow_up(),
                        body,
                        ts(Utc::now()),
                        T::KIND,
                        stored.id(),
                        expected as i64,
                    ],
                )
                .map_err(|e| DomainError::Database(format!("Failed to update {}: {e}", T::KIND)))?;
            if rows == 0 {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM records WHERE kind = ?1 AND id = ?2)",
                    params![T::KIND, stored.id()],
                    |row| row.get(0),
                )?;
                return Err(if exists {
                    DomainError::Conflict(format!("{} {}", T::KIND, stored.id()))
                } else {
                    DomainError::NotFound(format!("{} {}", T::KIND, stored.id()))
                });
            }
        }
        self.bump();
        Ok(stored)
    }

    async fn query(
        &self,
        filter: &RecordFilter,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<T>, DomainError> {
        Self::select(&self.conn, filter, order, limit)
    }

    fn subscribe(&self, filter: RecordFilter, order: SortOrder, limit: Option<usize>) -> SnapshotStream<T> {
        let conn = self.conn.clone();
        let rx = self.changes.subscribe();
        stream::unfold((conn, rx, filter, true), move |(conn, mut rx, filter, first)| async move {
            if first {
                rx.borrow_and_update();
            } else if rx.changed().await.is_err() {
                return None;
            }
            let snap = Self::select(&conn, &filter, order, limit);
            Some((snap, (conn, rx, filter, false)))
        })
        .boxed()
    }
}
