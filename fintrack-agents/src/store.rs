use shared_types::{FinancialSnapshot, InsightsResponse};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::{Clock, SystemClock};
use crate::insights::InsightsSource;
use crate::storage::{is_fresh, CacheEntry, KeyValueStore, CACHE_KEY, CACHE_TTL_MS};

pub const NO_SNAPSHOT_MESSAGE: &str = "No financial data to analyze yet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    Idle,
    Loading,
    Ready,
    Error,
}

/// What the insights panel renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightsState {
    pub insights: Option<InsightsResponse>,
    pub loading: bool,
    pub error: Option<String>,
}

impl InsightsState {
    pub fn phase(&self) -> StorePhase {
        if self.loading {
            StorePhase::Loading
        } else if self.error.is_some() {
            StorePhase::Error
        } else if self.insights.is_some() {
            StorePhase::Ready
        } else {
            StorePhase::Idle
        }
    }
}

/// Client-side holder for the latest insights.
///
/// Successful fetches are written to the key-value store under [`CACHE_KEY`];
/// a fresh entry is picked up again by [`InsightsStore::load`]. Fetches are
/// not serialized: when two overlap, whichever finishes last sets the state,
/// and the cache ends up holding that same response.
pub struct InsightsStore {
    source: Arc<dyn InsightsSource>,
    cache: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    state: Mutex<InsightsState>,
    last_snapshot: Mutex<Option<FinancialSnapshot>>,
    /// Bumped under the state lock each time a response is applied
    applied: AtomicU64,
    /// Sequence number of the response last written to the cache
    cached: tokio::sync::Mutex<u64>,
}

impl InsightsStore {
    pub async fn load(source: Arc<dyn InsightsSource>, cache: Arc<dyn KeyValueStore>) -> Self {
        Self::load_with_clock(source, cache, Arc::new(SystemClock)).await
    }

    pub async fn load_with_clock(
        source: Arc<dyn InsightsSource>,
        cache: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cached = read_cached(cache.as_ref(), clock.now_millis()).await;

        Self {
            source,
            cache,
            clock,
            state: Mutex::new(InsightsState {
                insights: cached,
                ..Default::default()
            }),
            last_snapshot: Mutex::new(None),
            applied: AtomicU64::new(0),
            cached: tokio::sync::Mutex::new(0),
        }
    }

    pub fn state(&self) -> InsightsState {
        self.lock_state().clone()
    }

    pub fn insights(&self) -> Option<InsightsResponse> {
        self.lock_state().insights.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock_state().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    pub fn phase(&self) -> StorePhase {
        self.lock_state().phase()
    }

    /// Request new insights for `snapshot`, returning this call's outcome
    /// as the user-facing result.
    pub async fn fetch(&self, snapshot: FinancialSnapshot) -> Result<InsightsResponse, String> {
        {
            let mut state = self.lock_state();
            state.loading = true;
            state.error = None;
        }
        *self.lock_snapshot() = Some(snapshot.clone());

        match self.source.fetch_insights(&snapshot).await {
            Ok(response) => {
                let seq = {
                    let mut state = self.lock_state();
                    state.insights = Some(response.clone());
                    state.loading = false;
                    state.error = None;
                    self.applied.fetch_add(1, Ordering::SeqCst) + 1
                };
                self.write_cache(&response, seq).await;
                Ok(response)
            }
            Err(e) => {
                tracing::error!("Failed to fetch insights: {}", e);
                let message = e.user_message();
                let mut state = self.lock_state();
                state.loading = false;
                state.error = Some(message.clone());
                Err(message)
            }
        }
    }

    /// Fetch again with the snapshot from the previous `fetch`
    pub async fn refresh(&self) -> Result<InsightsResponse, String> {
        let snapshot = self.lock_snapshot().clone();
        match snapshot {
            Some(snapshot) => self.fetch(snapshot).await,
            None => {
                self.lock_state().error = Some(NO_SNAPSHOT_MESSAGE.to_string());
                Err(NO_SNAPSHOT_MESSAGE.to_string())
            }
        }
    }

    /// Persist `response` unless a later-applied response is already cached
    async fn write_cache(&self, response: &InsightsResponse, seq: u64) {
        let mut cached = self.cached.lock().await;
        if *cached > seq {
            tracing::debug!("Skipping cache write for superseded insights");
            return;
        }

        let entry = CacheEntry {
            data: response.clone(),
            timestamp: self.clock.now_millis(),
        };

        let serialized = match serde_json::to_string(&entry) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::warn!("Failed to serialize insights cache entry: {}", e);
                return;
            }
        };

        match self.cache.set_item(CACHE_KEY, &serialized).await {
            Ok(()) => *cached = seq,
            Err(e) => tracing::warn!("Failed to write insights cache: {}", e),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, InsightsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_snapshot(&self) -> MutexGuard<'_, Option<FinancialSnapshot>> {
        self.last_snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn read_cached(cache: &dyn KeyValueStore, now_ms: i64) -> Option<InsightsResponse> {
    let raw = match cache.get_item(CACHE_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Failed to read insights cache: {}", e);
            return None;
        }
    };

    let entry: CacheEntry = match serde_json::from_str(&raw) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!("Ignoring unreadable insights cache entry: {}", e);
            return None;
        }
    };

    if is_fresh(now_ms, entry.timestamp, CACHE_TTL_MS) {
        tracing::debug!("Loaded cached insights from {}", entry.data.timestamp);
        Some(entry.data)
    } else {
        tracing::debug!("Cached insights expired");
        None
    }
}
