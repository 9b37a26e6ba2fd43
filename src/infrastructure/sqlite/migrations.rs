use crate::domain::error::DomainError;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS records (
            kind TEXT NOT NULL,
            id TEXT NOT NULL,
            version INTEGER NOT NULL,
            status TEXT NOT NULL,
            owner TEXT,
            created_at TEXT NOT NULL,
            expires_at TEXT,
            rank REAL NOT NULL DEFAULT 0,
            follow_up INTEGER NOT NULL DEFAULT 0,
            body TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (kind, id)
        );

        CREATE INDEX IF NOT EXISTS idx_records_status ON records(kind, status);
        CREATE INDEX IF NOT EXISTS idx_records_owner ON records(kind, owner);
        CREATE INDEX IF NOT EXISTS idx_records_created ON records(kind, created_at);
        CREATE INDEX IF NOT EXISTS idx_records_expires ON records(kind, expires_at);
        CREATE INDEX IF NOT EXISTS idx_records_follow_up ON records(kind, follow_up);
        "
    ).map_err(|e| DomainError::Database(format!("Migration failed: {e}")))
}
