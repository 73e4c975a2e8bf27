//! SqliteStatusStore: durable package signing status.
//!
//! One row per package key. Every write is a single upsert statement, so
//! concurrent writers for the same key serialise inside SQLite and the last
//! write wins.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use sigvet_core::{PackageIdentity, PackageSigningStatus, StatusStore};

use crate::error::{RegistryError, RegistryResult};

/// DDL for the signing state table.
///
/// Schema version: 1
pub const SIGNING_STATE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS package_signing_state (
    package_key      INTEGER PRIMARY KEY,
    package_id       TEXT NOT NULL,
    package_version  TEXT NOT NULL,
    status           TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_package_signing_state_id
    ON package_signing_state(package_id, package_version);
"#;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A persisted signing status row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigningStateRow {
    pub package_key: i64,
    pub package_id: String,
    pub package_version: String,
    pub status: PackageSigningStatus,
    pub updated_at: DateTime<Utc>,
}

/// SQLite-backed status store.
#[derive(Clone)]
pub struct SqliteStatusStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStatusStore {
    /// Open a file-backed store.
    pub fn open(path: &Path) -> RegistryResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn memory() -> RegistryResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_connection(conn: &Connection) -> RegistryResult<()> {
        // In-memory databases answer "memory" here; only file-backed ones switch to WAL.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SIGNING_STATE_SCHEMA)?;
        Ok(())
    }

    /// SQLite journal mode in effect for this connection.
    pub fn journal_mode(&self) -> RegistryResult<String> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.pragma_query_value(None, "journal_mode", |row| row.get(0))?)
    }

    /// Upsert the status for a package.
    pub fn upsert_status(
        &self,
        identity: &PackageIdentity,
        status: PackageSigningStatus,
    ) -> RegistryResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO package_signing_state (
                package_key, package_id, package_version, status, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(package_key) DO UPDATE SET
                package_id = excluded.package_id,
                package_version = excluded.package_version,
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
            params![
                identity.key,
                identity.id,
                identity.version,
                status.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Current status for a package key.
    pub fn get(&self, package_key: i64) -> RegistryResult<Option<SigningStateRow>> {
        let conn = self.conn.lock().unwrap();
        let raw = conn
            .query_row(
                r#"
                SELECT package_key, package_id, package_version, status, updated_at
                FROM package_signing_state WHERE package_key = ?1
                "#,
                params![package_key],
                read_raw_row,
            )
            .optional()?;

        raw.map(RawRow::into_row).transpose()
    }

    /// All rows ordered by package key.
    pub fn list(&self) -> RegistryResult<Vec<SigningStateRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT package_key, package_id, package_version, status, updated_at
            FROM package_signing_state ORDER BY package_key ASC
            "#,
        )?;
        let raw = stmt
            .query_map([], read_raw_row)?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter().map(RawRow::into_row).collect()
    }
}

struct RawRow {
    package_key: i64,
    package_id: String,
    package_version: String,
    status: String,
    updated_at: String,
}

fn read_raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        package_key: row.get(0)?,
        package_id: row.get(1)?,
        package_version: row.get(2)?,
        status: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl RawRow {
    fn into_row(self) -> RegistryResult<SigningStateRow> {
        let status =
            PackageSigningStatus::parse(&self.status).ok_or_else(|| RegistryError::Database {
                message: format!(
                    "unknown signing status {:?} for package {}",
                    self.status, self.package_key
                ),
            })?;
        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map_err(|e| RegistryError::Database {
                message: format!("invalid updated_at for package {}: {}", self.package_key, e),
            })?
            .with_timezone(&Utc);

        Ok(SigningStateRow {
            package_key: self.package_key,
            package_id: self.package_id,
            package_version: self.package_version,
            status,
            updated_at,
        })
    }
}

#[async_trait]
impl StatusStore for SqliteStatusStore {
    async fn set_status(
        &self,
        identity: &PackageIdentity,
        status: PackageSigningStatus,
    ) -> anyhow::Result<()> {
        let store = self.clone();
        let identity = identity.clone();
        tokio::task::spawn_blocking(move || store.upsert_status(&identity, status)).await??;
        Ok(())
    }
}
