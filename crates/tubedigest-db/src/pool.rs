//! SQLite connection pool shared by the workers and the CLI.
//!
//! Every connection is prepared by [`StorePragmas`] when the pool opens it,
//! so foreign keys, the journal mode and the busy timeout hold for all
//! connections, not just the one that ran migrations.

use std::time::Duration;

use r2d2::{CustomizeConnection, Pool};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tubedigest_common::{Error, Result};

use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Sizing and lock-wait settings for [`init_pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Upper bound on open connections. Each worker holds at most one at a
    /// time, so five workers plus one admin command is enough.
    pub max_size: u32,
    /// How long a writer waits on a locked database before `SQLITE_BUSY`.
    pub busy_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: 6,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Applied to every connection the pool opens.
#[derive(Debug)]
struct StorePragmas {
    busy_timeout: Duration,
    wal: bool,
}

impl CustomizeConnection<Connection, rusqlite::Error> for StorePragmas {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(self.busy_timeout)?;
        if self.wal {
            // journal_mode answers with the mode now in effect.
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
        }
        Ok(())
    }
}

fn open(manager: SqliteConnectionManager, pragmas: StorePragmas, max_size: u32) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(max_size.max(1))
        .connection_customizer(Box::new(pragmas))
        .build(manager)
        .map_err(|e| Error::database(format!("cannot open store: {e}")))?;

    let conn = get_conn(&pool)?;
    migrations::run_migrations(&conn)?;
    Ok(pool)
}

/// Open (creating if needed) the store file at `db_path` and migrate it.
pub fn init_pool(db_path: &str, settings: &PoolSettings) -> Result<DbPool> {
    tracing::debug!(
        path = db_path,
        max_size = settings.max_size,
        busy_timeout_ms = settings.busy_timeout.as_millis() as u64,
        "Opening store"
    );
    open(
        SqliteConnectionManager::file(db_path),
        StorePragmas {
            busy_timeout: settings.busy_timeout,
            wal: true,
        },
        settings.max_size,
    )
}

/// A private, migrated in-memory store for tests.
///
/// Each call gets its own shared-cache database name, so the pool's
/// connections see one another's writes while separate pools stay isolated.
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let uri = format!(
        "file:tubedigest_mem_{}?mode=memory&cache=shared",
        NEXT.fetch_add(1, Ordering::Relaxed)
    );

    let settings = PoolSettings::default();
    open(
        SqliteConnectionManager::file(uri),
        StorePragmas {
            busy_timeout: settings.busy_timeout,
            wal: false,
        },
        settings.max_size,
    )
}

/// Borrow a connection from the pool.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("no store connection available: {e}")))
}
