//! SQLite implementation of the Registry trait.
//!
//! The local fallback ledger. Grants survive restarts, and every mutation
//! runs inside a transaction on a mutex-guarded connection. Access counting
//! is a single conditional `UPDATE` so the increment cannot race the checks.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use sharevault_core::{
    derive_grant_id, AccessGrant, AuditRecord, Clock, ContentId, GrantDetails, GrantId,
    GrantIdContext, Owner, PasswordDigest, SystemClock,
};
use sharevault_store::{migrate, Migration};

use crate::error::{RegistryError, Result};
use crate::traits::Registry;

/// Schema of the local grant ledger.
pub const REGISTRY_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: r#"
        -- Grants table: one row per access grant
        CREATE TABLE grants (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,   -- creation order
            id TEXT NOT NULL UNIQUE,                 -- 0x-prefixed hex grant id
            owner TEXT NOT NULL,
            content_id TEXT NOT NULL,
            expiry_time INTEGER NOT NULL,            -- Unix seconds
            password_digest BLOB,                    -- 32 bytes, NULL if unprotected
            access_count INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL
        );

        -- Index for listing an owner's grants
        CREATE INDEX idx_grants_owner ON grants(owner, seq);
    "#,
}];

const GRANT_COLUMNS: &str =
    "id, owner, content_id, expiry_time, password_digest, access_count, is_active, created_at";

/// SQLite-based registry.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Clone)]
pub struct SqliteRegistry {
    conn: Arc<Mutex<Connection>>,
    caller: Owner,
    clock: Arc<dyn Clock>,
}

impl SqliteRegistry {
    /// Open a SQLite database at the given path, acting as `caller`.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>, caller: impl Into<Owner>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, caller.into())
    }

    /// Open an in-memory SQLite database, acting as `caller`.
    ///
    /// Useful for testing.
    pub fn open_memory(caller: impl Into<Owner>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, caller.into())
    }

    fn from_connection(mut conn: Connection, caller: Owner) -> Result<Self> {
        migrate(&mut conn, REGISTRY_MIGRATIONS)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            caller,
            clock: Arc::new(SystemClock),
        })
    }

    /// Evaluate expiry against a custom clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// A view of the same database acting as a different caller.
    pub fn connect_as(&self, caller: impl Into<Owner>) -> Self {
        Self {
            conn: self.conn.clone(),
            caller: caller.into(),
            clock: self.clock.clone(),
        }
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| RegistryError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| RegistryError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

/// Map a `grants` row (selected with [`GRANT_COLUMNS`]) to a grant.
fn row_to_grant(row: &Row<'_>) -> rusqlite::Result<AccessGrant> {
    let id: String = row.get(0)?;
    let id = GrantId::from_hex(&id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

    let digest: Option<Vec<u8>> = row.get(4)?;
    let password_digest = match digest {
        Some(bytes) => PasswordDigest::from_wire(&bytes)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Blob, Box::new(e)))?,
        None => None,
    };

    Ok(AccessGrant {
        id,
        owner: Owner::new(row.get::<_, String>(1)?),
        content_id: ContentId::new(row.get::<_, String>(2)?),
        expiry_time: row.get(3)?,
        password_digest,
        access_count: row.get::<_, i64>(5)? as u64,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn load_grant(conn: &Connection, id: &GrantId) -> Result<AccessGrant> {
    let sql = format!("SELECT {} FROM grants WHERE id = ?1", GRANT_COLUMNS);
    conn.query_row(&sql, params![id.to_hex()], row_to_grant)
        .optional()?
        .ok_or(RegistryError::NotFound(*id))
}

fn load_owned_grant(conn: &Connection, id: &GrantId, caller: &Owner) -> Result<AccessGrant> {
    let grant = load_grant(conn, id)?;
    if !grant.is_owned_by(caller) {
        return Err(RegistryError::Unauthorized(*id));
    }
    Ok(grant)
}

#[async_trait]
impl Registry for SqliteRegistry {
    fn caller(&self) -> &Owner {
        &self.caller
    }

    async fn create_access_grant(
        &self,
        content_id: &ContentId,
        duration_seconds: u64,
        password_digest: Option<PasswordDigest>,
    ) -> Result<GrantId> {
        if duration_seconds == 0 {
            return Err(RegistryError::InvalidDuration);
        }

        let now = self.clock.now();
        let owner = self.caller.clone();
        let content_id = content_id.clone();

        let id = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;

                let sequence: i64 = tx.query_row(
                    "SELECT COALESCE(MAX(seq), 0) + 1 FROM grants",
                    [],
                    |row| row.get(0),
                )?;

                let id = derive_grant_id(&GrantIdContext {
                    owner: &owner,
                    content_id: &content_id,
                    duration_seconds,
                    password_digest: password_digest.as_ref(),
                    created_at: now,
                    sequence: sequence as u64,
                });
                let grant =
                    AccessGrant::new(id, owner, content_id, now, duration_seconds, password_digest);

                tx.execute(
                    "INSERT INTO grants (id, owner, content_id, expiry_time, password_digest,
                                         access_count, is_active, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, 0, 1, ?6)",
                    params![
                        grant.id.to_hex(),
                        grant.owner.as_str(),
                        grant.content_id.as_str(),
                        grant.expiry_time,
                        grant.password_digest.as_ref().map(|d| d.as_bytes().to_vec()),
                        grant.created_at,
                    ],
                )?;

                tx.commit()?;
                Ok(id)
            })
            .await?;

        tracing::debug!(grant = %id, duration_seconds, "created grant");
        Ok(id)
    }

    async fn verify_access(&self, id: &GrantId, password: &str) -> Result<ContentId> {
        let now = self.clock.now();
        let id = *id;
        let password = password.to_string();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let grant = load_grant(&tx, &id)?;
            grant
                .check_access(now, &password)
                .map_err(|d| RegistryError::denied(id, d))?;

            let changed = tx.execute(
                "UPDATE grants SET access_count = access_count + 1
                 WHERE id = ?1 AND is_active = 1 AND expiry_time >= ?2",
                params![id.to_hex(), now],
            )?;
            if changed == 0 {
                return Err(RegistryError::Expired(id));
            }

            tx.commit()?;
            Ok(grant.content_id)
        })
        .await
    }

    async fn revoke(&self, id: &GrantId) -> Result<()> {
        let id = *id;
        let caller = self.caller.clone();

        let changed = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                load_owned_grant(&tx, &id, &caller)?;

                let changed = tx.execute(
                    "UPDATE grants SET is_active = 0 WHERE id = ?1 AND is_active = 1",
                    params![id.to_hex()],
                )?;

                tx.commit()?;
                Ok(changed)
            })
            .await?;

        if changed > 0 {
            tracing::debug!(grant = %id, "revoked grant");
        }
        Ok(())
    }

    async fn extend(&self, id: &GrantId, new_expiry: i64) -> Result<()> {
        let now = self.clock.now();
        let id = *id;
        let caller = self.caller.clone();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let grant = load_owned_grant(&tx, &id, &caller)?;
            grant
                .check_extend(now, new_expiry)
                .map_err(|d| RegistryError::denied(id, d))?;

            tx.execute(
                "UPDATE grants SET expiry_time = ?2 WHERE id = ?1",
                params![id.to_hex(), new_expiry],
            )?;

            tx.commit()?;
            Ok(())
        })
        .await?;

        tracing::debug!(grant = %id, new_expiry, "extended grant");
        Ok(())
    }

    async fn get_access_grant_details(&self, id: &GrantId) -> Result<GrantDetails> {
        let id = *id;
        self.with_conn(move |conn| Ok(load_grant(conn, &id)?.details()))
            .await
    }

    async fn audit_record(&self, id: &GrantId) -> Result<AuditRecord> {
        let id = *id;
        self.with_conn(move |conn| Ok(load_grant(conn, &id)?.audit_record()))
            .await
    }

    async fn grants_by_owner(&self, owner: &Owner) -> Result<Vec<AuditRecord>> {
        let owner = owner.clone();

        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {} FROM grants WHERE owner = ?1 ORDER BY seq",
                GRANT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let records = stmt
                .query_map(params![owner.as_str()], row_to_grant)?
                .map(|r| r.map(|g| g.audit_record()))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }
}
