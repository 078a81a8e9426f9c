use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use std::path::Path;

/// Thread-safe key/value store backed by an r2d2 connection pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Failed to serialize stored value: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("State lock poisoned: {0}")]
    Poisoned(String),
}

const DEFAULT_DB_POOL_SIZE: u32 = 4;

fn db_pool_size() -> u32 {
    if let Ok(raw) = std::env::var("PLANNER_DB_POOL_SIZE") {
        if let Ok(parsed) = raw.parse::<u32>() {
            return parsed.clamp(1, 16);
        }
    }
    DEFAULT_DB_POOL_SIZE
}

fn apply_connection_pragmas(conn: &Connection) -> SqlResult<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         PRAGMA busy_timeout=5000;",
    )?;
    Ok(())
}

impl Database {
    /// Opens or creates the SQLite database at the given path.
    pub fn new(db_path: &Path) -> Result<Self, StoreError> {
        let manager =
            SqliteConnectionManager::file(db_path).with_init(|conn| apply_connection_pragmas(conn));
        let pool = Pool::builder().max_size(db_pool_size()).build(manager)?;

        let db = Database { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );",
        )?;
        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.pool.get()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Writes `value` under `key`, replacing any previous record atomically.
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }
}
