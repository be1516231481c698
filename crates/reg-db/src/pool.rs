//! r2d2 pools of SQLite connections.
//!
//! Every connection runs with `foreign_keys = ON`; a pool is only handed out
//! after the schema has been brought up to date.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use reg_core::config::DatabaseConfig;
use reg_core::{Error, Result};

use crate::migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Open (or create) the database at `db_path` in WAL mode, with the
/// configured pool size and busy timeout.
pub fn init_pool(db_path: &str, settings: &DatabaseConfig) -> Result<DbPool> {
    let busy_ms = settings.busy_timeout_ms;
    let manager = SqliteConnectionManager::file(db_path).with_init(move |conn| {
        conn.execute_batch(&format!(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = {busy_ms};"
        ))
    });
    migrated(manager, settings.pool_size.max(1))
}

/// A private in-memory database, named per call so concurrent tests stay
/// isolated. Connections of one pool share it through the shared cache.
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let uri = format!(
        "file:registrar_memdb_{}?mode=memory&cache=shared",
        NEXT.fetch_add(1, Ordering::Relaxed)
    );

    let manager = SqliteConnectionManager::file(uri)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    migrated(manager, 4)
}

fn migrated(manager: SqliteConnectionManager, max_size: u32) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| Error::database(format!("building connection pool: {e}")))?;
    let conn = get_conn(&pool)?;
    migrations::run_migrations(&conn)?;
    Ok(pool)
}

pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("no database connection available: {e}")))
}
