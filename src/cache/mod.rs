//! Keyed in-memory query cache
//!
//! Stores fetched results under structured keys with a stale-time policy and
//! prefix invalidation. Invalidation marks entries stale and notifies
//! subscribers so active consumers can refetch; it never deletes data.

mod key;

pub use key::{canonical_json, KeyFactory, KeyScope, QueryKey};

use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry is served without refetching
    pub stale_time: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(300), // 5 minutes
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    data: Value,
    stored_at: Instant,
    stale: bool,
}

/// In-memory query cache with prefix invalidation
///
/// Values are stored as JSON so a single store serves every response type.
/// The inner mutex is held only for map operations, never across an await.
pub struct QueryCache {
    config: CacheConfig,
    entries: Mutex<HashMap<QueryKey, Entry>>,
    invalidations: broadcast::Sender<QueryKey>,
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        let (invalidations, _) = broadcast::channel(64);
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
            invalidations,
        }
    }

    /// Look up a fresh entry under `key`
    ///
    /// Returns `None` when the key is absent, the entry has been invalidated,
    /// or it has outlived the stale time (`stale_time` overrides the
    /// configured default for this call).
    pub fn get_fresh<T: DeserializeOwned>(
        &self,
        key: &QueryKey,
        stale_time: Option<Duration>,
    ) -> Option<T> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(key)?;

        let limit = stale_time.unwrap_or(self.config.stale_time);
        if entry.stale || entry.stored_at.elapsed() >= limit {
            tracing::debug!(%key, "Cache entry stale");
            return None;
        }

        match serde_json::from_value(entry.data.clone()) {
            Ok(value) => {
                tracing::debug!(%key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "Cached value failed to deserialize");
                None
            }
        }
    }

    /// Store a fetched result under `key`, replacing any prior entry
    pub fn insert<T: Serialize>(&self, key: QueryKey, value: &T) -> Result<()> {
        let data = serde_json::to_value(value)?;
        tracing::debug!(%key, "Storing cache entry");
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            Entry {
                data,
                stored_at: Instant::now(),
                stale: false,
            },
        );
        Ok(())
    }

    /// Mark every entry covered by `prefix` as stale and notify subscribers
    ///
    /// Returns the number of entries marked. Subscribers receive the prefix
    /// itself, once per call, regardless of how many entries it reached.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let mut marked = 0;
        for (key, entry) in entries.iter_mut() {
            if prefix.covers(key) && !entry.stale {
                entry.stale = true;
                marked += 1;
            }
        }
        drop(entries);

        tracing::debug!(%prefix, marked, "Invalidated cache entries");
        // No receivers is fine; invalidation stands on its own
        let _ = self.invalidations.send(prefix.clone());
        marked
    }

    /// Subscribe to invalidation notifications
    ///
    /// Each received key is the prefix passed to `invalidate`; consumers
    /// holding a key can test it with `QueryKey::covers`.
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.invalidations.subscribe()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
