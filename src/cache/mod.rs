//! Cache of fetched view trees, keyed by request signature.

mod storage;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::network::HttpMethod;
use crate::tree::Tree;

pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};

/// What gets serialized into the storage for each cached view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub tree: Tree,
    /// Milliseconds since the Unix epoch at write time.
    pub timestamp: u64,
    /// Overrides the store's max age (from `Cache-Control: max-age`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_seconds: Option<u64>,
}

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Fresh(Tree),
    Expired(Tree),
    Missing,
}

/// TTL-aware view cache over an injected [`Storage`].
#[derive(Clone)]
pub struct CacheStore {
    storage: Arc<dyn Storage>,
    max_age: Duration,
    namespace: String,
}

impl CacheStore {
    pub fn new(storage: Arc<dyn Storage>, config: &CacheConfig) -> Self {
        Self {
            storage,
            max_age: Duration::from_secs(config.max_age_seconds),
            namespace: config.namespace.clone(),
        }
    }

    /// Deterministic key for a request.
    ///
    /// Header names are compared case-insensitively; header order never
    /// matters.
    pub fn signature(
        &self,
        url: &str,
        method: HttpMethod,
        headers: &BTreeMap<String, String>,
    ) -> String {
        let mut signature = format!("{} {} {}", self.namespace, method.as_str(), url);
        let normalized: BTreeMap<String, &str> = headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.as_str()))
            .collect();
        if !normalized.is_empty() {
            let joined = normalized
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join(";");
            signature.push_str(&format!(" [{}]", joined));
        }
        signature
    }

    pub fn read(&self, key: &str) -> CacheLookup {
        let Some(raw) = self.storage.get_item(key) else {
            return CacheLookup::Missing;
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding corrupt cache entry");
                self.remove(key);
                return CacheLookup::Missing;
            }
        };

        let max_age = entry
            .max_age_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.max_age);
        let age = Duration::from_millis(now_millis().saturating_sub(entry.timestamp));

        if age > max_age {
            tracing::debug!(key = %key, age_ms = age.as_millis() as u64, "Cache entry expired");
            CacheLookup::Expired(entry.tree)
        } else {
            CacheLookup::Fresh(entry.tree)
        }
    }

    /// Persists `tree`. Failures are logged, never propagated.
    pub fn write(&self, key: &str, tree: &Tree, max_age_seconds: Option<u64>) {
        let entry = CacheEntry {
            key: key.to_string(),
            tree: tree.clone(),
            timestamp: now_millis(),
            max_age_seconds,
        };

        let serialized = match serde_json::to_string(&entry) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        if let Err(e) = self.storage.set_item(key, &serialized) {
            tracing::warn!(key = %key, error = %e, "Failed to write cache entry");
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove_item(key) {
            tracing::warn!(key = %key, error = %e, "Failed to remove cache entry");
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
