//! Per-operation connection provisioning.

use r2d2::ManageConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Attempts at switching a new database file to WAL before giving up.
const WAL_SWITCH_ATTEMPTS: u32 = 50;

/// Pause between WAL switch attempts.
const WAL_SWITCH_BACKOFF: Duration = Duration::from_millis(10);

/// Settings identifying the relational store.
///
/// The embedded store only needs a database file; `host` and `user` are kept
/// so connection diagnostics name the configured target. The password is
/// never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Store host (default `localhost`).
    pub host: String,

    /// Store user (default `root`).
    pub user: String,

    /// Store password (default empty).
    pub password: String,

    /// Database name or path (default `support_db`).
    pub name: String,

    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            user: "root".to_string(),
            password: String::new(),
            name: "support_db".to_string(),
            busy_timeout_ms: 5_000,
        }
    }
}

impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .finish()
    }
}

impl StoreSettings {
    /// Resolves the database name to the file SQLite should open.
    ///
    /// Names that already look like a path (contain a separator, carry a
    /// `.db`/`.sqlite` extension, or are `:memory:`) are used as given;
    /// bare names get a `.db` suffix.
    pub fn database_path(&self) -> String {
        let name = self.name.as_str();
        let looks_like_path = name == ":memory:"
            || name.contains('/')
            || name.contains(std::path::MAIN_SEPARATOR)
            || name.ends_with(".db")
            || name.ends_with(".sqlite");

        if looks_like_path {
            name.to_string()
        } else {
            format!("{name}.db")
        }
    }
}

/// Puts the database into WAL mode, tolerating concurrent first connections.
///
/// Files already in WAL mode are left alone. On a new file several
/// connections may race to switch it; the loser either sees a busy/locked
/// error or gets the old mode back, so both are retried a bounded number of
/// times. In-memory databases report "memory", which is acceptable.
fn ensure_wal(conn: &Connection) -> rusqlite::Result<()> {
    let mut attempt = 1;
    loop {
        let result = conn
            .query_row("PRAGMA journal_mode;", [], |row| row.get::<_, String>(0))
            .and_then(|mode| {
                if is_wal_or_memory(&mode) {
                    Ok(mode)
                } else {
                    conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
                }
            });

        match result {
            Ok(mode) if is_wal_or_memory(&mode) => return Ok(()),
            Err(e) if !is_contention(&e) => return Err(e),
            Ok(mode) if attempt >= WAL_SWITCH_ATTEMPTS => {
                return Err(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                    Some(format!("failed to set WAL journal mode, got: {}", mode)),
                ));
            }
            Err(e) if attempt >= WAL_SWITCH_ATTEMPTS => return Err(e),
            _ => {
                tracing::debug!(attempt, "journal mode switch contended, retrying");
                attempt += 1;
                thread::sleep(WAL_SWITCH_BACKOFF);
            }
        }
    }
}

fn is_wal_or_memory(mode: &str) -> bool {
    mode.eq_ignore_ascii_case("wal") || mode.eq_ignore_ascii_case("memory")
}

fn is_contention(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if matches!(f.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

/// Hands out a fresh connection for each store operation.
///
/// Implementations report a missing store by returning `None` after logging
/// the cause; they never panic. The caller owns the returned connection and
/// releases it by dropping it.
pub trait ConnectionProvider: Send + Sync {
    /// Opens a new connection, or `None` if the store is unreachable.
    fn connect(&self) -> Option<Connection>;
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for Arc<P> {
    fn connect(&self) -> Option<Connection> {
        (**self).connect()
    }
}

/// SQLite connection provider with WAL mode and foreign keys enabled.
pub struct SqliteProvider {
    settings: StoreSettings,
    path: String,
    manager: SqliteConnectionManager,
}

impl SqliteProvider {
    /// Builds a provider for the configured database. No connection is opened
    /// until [`ConnectionProvider::connect`] is called.
    pub fn new(settings: StoreSettings) -> Self {
        let path = settings.database_path();
        let busy_timeout_ms = settings.busy_timeout_ms;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

        let manager = SqliteConnectionManager::file(&path)
            .with_flags(flags)
            .with_init(move |conn| {
                // Busy timeout first: switching a fresh file to WAL needs a
                // lock that a concurrent first connection may be holding.
                conn.execute_batch(&format!("PRAGMA busy_timeout = {};", busy_timeout_ms))?;
                ensure_wal(conn)?;
                conn.execute_batch("PRAGMA foreign_keys = ON;")
            });

        Self {
            settings,
            path,
            manager,
        }
    }

    /// The settings this provider was built from.
    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// The database file this provider opens.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ConnectionProvider for SqliteProvider {
    fn connect(&self) -> Option<Connection> {
        match self.manager.connect() {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::error!(
                    host = %self.settings.host,
                    user = %self.settings.user,
                    database = %self.path,
                    error = %e,
                    "database connection error"
                );
                None
            }
        }
    }
}
