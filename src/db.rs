use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use r2d2::{ManageConnection, Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::Result;

pub type Conn = PooledConnection<Handoff>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL,
    birth_date TEXT NOT NULL,
    age INTEGER NOT NULL,
    gender TEXT NOT NULL,
    country TEXT NOT NULL,
    password_hash TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS production_companies (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    release_year INTEGER NOT NULL,
    language TEXT NOT NULL,
    production_company_id INTEGER,
    FOREIGN KEY (production_company_id) REFERENCES production_companies(id)
);

CREATE TABLE IF NOT EXISTS staff (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    birth_country TEXT NOT NULL,
    role TEXT NOT NULL,
    is_alive INTEGER DEFAULT 1
);

CREATE TABLE IF NOT EXISTS nominations (
    id INTEGER PRIMARY KEY,
    staff_id INTEGER NOT NULL,
    movie_id INTEGER NOT NULL,
    category TEXT NOT NULL,
    year INTEGER NOT NULL,
    FOREIGN KEY (staff_id) REFERENCES staff(id),
    FOREIGN KEY (movie_id) REFERENCES movies(id)
);

CREATE TABLE IF NOT EXISTS oscars (
    id INTEGER PRIMARY KEY,
    staff_id INTEGER NOT NULL,
    movie_id INTEGER NOT NULL,
    category TEXT NOT NULL,
    year INTEGER NOT NULL,
    FOREIGN KEY (staff_id) REFERENCES staff(id),
    FOREIGN KEY (movie_id) REFERENCES movies(id)
);

CREATE TABLE IF NOT EXISTS user_nominations (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    staff_id INTEGER NOT NULL,
    movie_id INTEGER NOT NULL,
    category TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (user_id) REFERENCES users(id),
    FOREIGN KEY (staff_id) REFERENCES staff(id),
    FOREIGN KEY (movie_id) REFERENCES movies(id)
);

CREATE INDEX IF NOT EXISTS idx_nominations_staff ON nominations(staff_id);
CREATE INDEX IF NOT EXISTS idx_oscars_staff ON oscars(staff_id);
CREATE INDEX IF NOT EXISTS idx_user_nominations_user ON user_nominations(user_id);
";

/// Opens store connections on behalf of callers, one attempt per request.
struct Dialer {
    manager: SqliteConnectionManager,
    ready: Mutex<Vec<Connection>>,
    attempts: AtomicUsize,
    opened: AtomicUsize,
}

impl Dialer {
    fn dial(&self) -> Result<Connection> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("store connect attempt #{n}");
        let conn = self.manager.connect()?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(conn)
    }

    fn hand_over(&self, conn: Connection) {
        if let Ok(mut ready) = self.ready.lock() {
            ready.push(conn);
        }
    }

    fn take(&self) -> Option<Connection> {
        self.ready.lock().ok().and_then(|mut ready| ready.pop())
    }
}

/// Pool manager that only adopts connections `Store::conn` already opened.
/// The pool never dials the store itself, so a failed connect is never
/// retried in the background.
pub struct Handoff(Arc<Dialer>);

impl ManageConnection for Handoff {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> std::result::Result<Connection, rusqlite::Error> {
        self.0.take().ok_or_else(|| {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                Some("no connection handed over".to_string()),
            )
        })
    }

    fn is_valid(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch("")
    }

    fn has_broken(&self, _conn: &mut Connection) -> bool {
        false
    }
}

/// Pooled handle to the SQLite store. Nothing is opened until the first
/// request; each caller holds its own connection for the duration of a call.
#[derive(Clone)]
pub struct Store {
    pool: Pool<Handoff>,
    dialer: Arc<Dialer>,
}

impl Store {
    pub fn open(db_path: &Path, max_size: u32) -> Result<Store> {
        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        });
        let dialer = Arc::new(Dialer {
            manager,
            ready: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            opened: AtomicUsize::new(0),
        });
        let pool = Pool::builder()
            .max_size(max_size.max(1))
            .min_idle(Some(0))
            .connection_timeout(CONNECT_TIMEOUT)
            .error_handler(Box::new(r2d2::NopErrorHandler))
            .build_unchecked(Handoff(Arc::clone(&dialer)));
        log::info!("store pool ready for {}", db_path.display());
        Ok(Store { pool, dialer })
    }

    /// Check out an idle connection, or make exactly one attempt to open a
    /// new one. A failed attempt is returned immediately.
    pub fn conn(&self) -> Result<Conn> {
        if let Some(conn) = self.pool.try_get() {
            return Ok(conn);
        }
        if self.pool.state().connections < self.pool.max_size() {
            let conn = self.dialer.dial()?;
            self.dialer.hand_over(conn);
        }
        Ok(self.pool.get()?)
    }

    /// Number of physical connections opened over the store's lifetime.
    pub fn connections_opened(&self) -> usize {
        self.dialer.opened.load(Ordering::SeqCst)
    }

    /// Number of connect attempts, failed ones included.
    pub fn connect_attempts(&self) -> usize {
        self.dialer.attempts.load(Ordering::SeqCst)
    }
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("test.db"), 4).unwrap();
    init_db(&store.conn().unwrap()).unwrap();
    (dir, store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, store) = test_store();
        let conn = store.conn().unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &[
            "users",
            "production_companies",
            "movies",
            "staff",
            "nominations",
            "oscars",
            "user_nominations",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, store) = test_store();
        init_db(&store.conn().unwrap()).unwrap();
    }

    #[test]
    fn test_pool_connects_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("lazy.db"), 4).unwrap();
        assert_eq!(store.connections_opened(), 0);
        {
            let _conn = store.conn().unwrap();
            assert_eq!(store.connections_opened(), 1);
        }
        let _again = store.conn().unwrap();
        assert_eq!(store.connections_opened(), 1, "idle connection should be reused");
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let (_dir, store) = test_store();
        let conn = store.conn().unwrap();
        let err = conn.execute(
            "INSERT INTO nominations (staff_id, movie_id, category, year) VALUES (999, 999, 'Best Picture', 2020)",
            [],
        );
        assert!(err.is_err(), "dangling references must be rejected");
    }

    #[test]
    fn test_unreachable_store_fails_after_one_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("no-such-dir").join("x.db"), 4).unwrap();

        let started = std::time::Instant::now();
        let err = store.conn().err().unwrap();
        assert!(started.elapsed() < Duration::from_secs(1), "took {:?}", started.elapsed());
        assert_eq!(err.kind(), crate::error::FailureKind::Unavailable);
        assert_eq!(store.connect_attempts(), 1);
        assert_eq!(store.connections_opened(), 0);

        assert!(store.conn().is_err());
        assert_eq!(store.connect_attempts(), 2, "each request makes one attempt");
    }

    #[test]
    fn test_concurrent_callers_get_own_connections() {
        let (_dir, store) = test_store();
        let a = store.conn().unwrap();
        let b = store.conn().unwrap();
        assert_eq!(store.connections_opened(), 2);
        drop(a);
        drop(b);
    }
}
