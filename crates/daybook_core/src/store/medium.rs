//! Storage media: raw text-per-key persistence backends.
//!
//! # Responsibility
//! - Define the medium seam the key-value store writes through.
//! - Provide the SQLite device medium and an in-memory test medium.
//!
//! # Invariants
//! - A medium stores and returns text verbatim; namespacing, JSON and
//!   encryption are the key-value layer's business.
//! - SQLite connections are unusable before migrations succeed.
//! - Media serialize their raw operations internally, so `&self` access
//!   from multiple call sites cannot interleave a single read or write.

use super::{MediumResult, StoreError, StoreResult};
use log::{error, info};
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

/// Raw text-per-key storage backend.
pub trait StorageMedium {
    fn read(&self, key: &str) -> MediumResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> MediumResult<()>;
    fn delete(&self, key: &str) -> MediumResult<()>;
    /// Every key currently present, unfiltered.
    fn keys(&self) -> MediumResult<Vec<String>>;
}

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: "CREATE TABLE kv_entries (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL DEFAULT 0
    );",
}];

/// Latest schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// SQLite-backed device medium: one row per key in `kv_entries`.
pub struct SqliteMedium {
    conn: Mutex<Connection>,
}

impl SqliteMedium {
    /// Opens (or creates) the storage file and applies pending migrations.
    ///
    /// # Side effects
    /// - Emits `store_open` events with duration and status.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let started_at = Instant::now();
        info!("event=store_open module=store status=start mode=file");

        let conn = Connection::open(path).map_err(|err| {
            error!(
                "event=store_open module=store status=error mode=file duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            StoreError::Open(err.into())
        })?;

        Self::bootstrap(conn, "file", started_at)
    }

    /// Opens an in-memory SQLite medium, mostly for tests and diagnostics.
    pub fn open_in_memory() -> StoreResult<Self> {
        let started_at = Instant::now();
        info!("event=store_open module=store status=start mode=memory");

        let conn = Connection::open_in_memory().map_err(|err| {
            error!(
                "event=store_open module=store status=error mode=memory duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            StoreError::Open(err.into())
        })?;

        Self::bootstrap(conn, "memory", started_at)
    }

    fn bootstrap(mut conn: Connection, mode: &str, started_at: Instant) -> StoreResult<Self> {
        let result = (|| -> StoreResult<()> {
            conn.busy_timeout(Duration::from_secs(5))
                .map_err(|err| StoreError::Open(err.into()))?;
            apply_migrations(&mut conn)?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                info!(
                    "event=store_open module=store status=ok mode={} duration_ms={}",
                    mode,
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    conn: Mutex::new(conn),
                })
            }
            Err(err) => {
                error!(
                    "event=store_open module=store status=error mode={} duration_ms={} error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

impl StorageMedium for SqliteMedium {
    fn read(&self, key: &str) -> MediumResult<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> MediumResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> MediumResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }

    fn keys(&self) -> MediumResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT key FROM kv_entries ORDER BY key;")?;
        let mut rows = stmt.query([])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get::<_, String>(0)?);
        }
        Ok(keys)
    }
}

fn apply_migrations(conn: &mut Connection) -> StoreResult<()> {
    let current: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .map_err(|err| StoreError::Open(err.into()))?;
    let latest = latest_version();

    if current > latest {
        return Err(StoreError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .map_err(|err| StoreError::Open(err.into()))?;
    for migration in MIGRATIONS {
        if migration.version <= current {
            continue;
        }
        tx.execute_batch(migration.sql)
            .map_err(|err| StoreError::Open(err.into()))?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            .map_err(|err| StoreError::Open(err.into()))?;
    }
    tx.commit().map_err(|err| StoreError::Open(err.into()))?;

    Ok(())
}

/// In-memory medium for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryMedium {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageMedium for MemoryMedium {
    fn read(&self, key: &str) -> MediumResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> MediumResult<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> MediumResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> MediumResult<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{latest_version, MemoryMedium, SqliteMedium, StorageMedium};
    use crate::store::StoreError;
    use rusqlite::Connection;

    #[test]
    fn sqlite_medium_round_trips_text() {
        let medium = SqliteMedium::open_in_memory().unwrap();
        assert_eq!(medium.read("k").unwrap(), None);

        medium.write("k", "value one").unwrap();
        assert_eq!(medium.read("k").unwrap().as_deref(), Some("value one"));

        medium.write("k", "value two").unwrap();
        assert_eq!(medium.read("k").unwrap().as_deref(), Some("value two"));

        medium.delete("k").unwrap();
        assert_eq!(medium.read("k").unwrap(), None);
    }

    #[test]
    fn sqlite_medium_lists_keys_in_stable_order() {
        let medium = SqliteMedium::open_in_memory().unwrap();
        medium.write("b", "2").unwrap();
        medium.write("a", "1").unwrap();
        assert_eq!(medium.keys().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn open_rejects_newer_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.sqlite3");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version() + 1))
                .unwrap();
        }

        let err = match SqliteMedium::open(&path) {
            Ok(_) => panic!("expected schema version rejection"),
            Err(err) => err,
        };
        assert!(matches!(
            err,
            StoreError::UnsupportedSchemaVersion { db_version, .. }
                if db_version == latest_version() + 1
        ));
    }

    #[test]
    fn memory_medium_round_trips_text() {
        let medium = MemoryMedium::new();
        medium.write("x", "1").unwrap();
        assert_eq!(medium.read("x").unwrap().as_deref(), Some("1"));
        medium.delete("x").unwrap();
        assert_eq!(medium.read("x").unwrap(), None);
    }
}
