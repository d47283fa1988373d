use super::KeyValueStore;
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Local-storage style table in a SQLite file
pub struct SqliteKeyValueStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKeyValueStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> anyhow::Result<Self> {
        {
            let conn = conn
                .lock()
                .map_err(|e| anyhow::anyhow!("SQLite connection lock poisoned: {}", e))?;
            conn.execute(
                "CREATE TABLE IF NOT EXISTS local_storage (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                )",
                [],
            )?;
        }

        Ok(Self { conn })
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::new(Arc::new(Mutex::new(conn)))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::new(Arc::new(Mutex::new(Connection::open_in_memory()?)))
    }
}

/// Returns the path to the local insights cache
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/fintrack/local_storage.db`
/// - **Linux**: `~/.local/share/fintrack/local_storage.db`
/// - **Windows**: `%LOCALAPPDATA%\fintrack\local_storage.db`
pub fn default_cache_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("fintrack").join("local_storage.db"))
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("SQLite connection lock poisoned: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    async fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("SQLite connection lock poisoned: {}", e))?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO local_storage (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, now],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();
        assert_eq!(store.get_item("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites_previous_value() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();
        store.set_item("k", "first").await.unwrap();
        store.set_item("k", "second").await.unwrap();
        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("second"));
    }
}
