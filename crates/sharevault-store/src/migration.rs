//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL batch
//! that transforms the schema from version N-1 to N. Every SQLite-backed
//! component in sharevault (the blob store here, the local registry) keeps
//! its own ordered list and runs it through [`migrate`].

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// One schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Version this migration produces (1-based, contiguous).
    pub version: u32,
    /// SQL executed as a batch.
    pub sql: &'static str,
}

/// Schema of the SQLite content store.
pub const CONTENT_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: r#"
        -- Blobs table: content id -> immutable bytes
        CREATE TABLE blobs (
            content_id TEXT PRIMARY KEY,      -- CIDv1 (raw, sha2-256, base32)
            data BLOB NOT NULL,               -- exact stored bytes
            size INTEGER NOT NULL,            -- length of data
            stored_at INTEGER NOT NULL        -- local timestamp of first store (Unix s)
        );
    "#,
}];

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection, migrations: &[Migration]) -> Result<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    let target = migrations.last().map(|m| m.version).unwrap_or(0);
    if current > target {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, target
        )));
    }

    let pending: Vec<&Migration> = migrations.iter().filter(|m| m.version > current).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    let mut expected = current + 1;

    for migration in pending {
        if migration.version != expected {
            return Err(StoreError::Migration(format!(
                "unknown migration version: {}",
                migration.version
            )));
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, now_secs()],
        )?;

        tracing::debug!(version = migration.version, "applied schema migration");
        expected += 1;
    }

    tx.commit()?;
    Ok(())
}

/// Get current time in seconds.
pub(crate) fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn, CONTENT_MIGRATIONS).unwrap();

        // Verify tables exist
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"blobs".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn, CONTENT_MIGRATIONS).unwrap();
        migrate(&mut conn, CONTENT_MIGRATIONS).unwrap(); // Should not error
        migrate(&mut conn, CONTENT_MIGRATIONS).unwrap(); // Still should not error

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_migration_rejects_gap() {
        const BROKEN: &[Migration] = &[
            Migration {
                version: 1,
                sql: "CREATE TABLE a (x INTEGER);",
            },
            Migration {
                version: 3,
                sql: "CREATE TABLE b (x INTEGER);",
            },
        ];

        let mut conn = Connection::open_in_memory().unwrap();
        assert!(matches!(
            migrate(&mut conn, BROKEN),
            Err(StoreError::Migration(_))
        ));
    }

    #[test]
    fn test_migration_rejects_newer_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn, CONTENT_MIGRATIONS).unwrap();
        assert!(migrate(&mut conn, &[]).is_err());
    }
}
