pub mod client;
pub mod clock;
pub mod error;
pub mod insights;
pub mod provider;
pub mod storage;
pub mod store;

pub use client::ApiInsightsClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{InsightsError, InsightsResult};
pub use insights::{InsightsPipeline, InsightsSource};
pub use provider::{CompletionProvider, OpenRouterConfig, OpenRouterGateway};
pub use storage::{CacheEntry, KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use store::{InsightsState, InsightsStore, StorePhase};
