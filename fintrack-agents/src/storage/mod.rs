pub mod memory_storage;
pub mod sqlite_storage;

pub use memory_storage::MemoryKeyValueStore;
pub use sqlite_storage::SqliteKeyValueStore;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::InsightsResponse;

/// Key the last successful insights are stored under
pub const CACHE_KEY: &str = "fintrack-ai-insights";

/// Cached insights stay usable for 6 hours
pub const CACHE_TTL_MS: i64 = 6 * 60 * 60 * 1000;

/// Last successful insights plus the epoch-millis time they were written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: InsightsResponse,
    pub timestamp: i64,
}

/// True while an entry written at `written_ms` is younger than `ttl_ms`
pub fn is_fresh(now_ms: i64, written_ms: i64, ttl_ms: i64) -> bool {
    now_ms - written_ms < ttl_ms
}

/// String key-value store with local-storage semantics: last write wins,
/// nothing expires on its own.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
}
