//! Envelope-level cache operations over a `KeyValueStore`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{AppSettings, Message, Player, Tournament};

use super::backend::{KeyValueStore, StoreError};
use super::entry::CacheEntry;
use super::key::{CacheKey, ExpiryPolicy};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("storage error for {key}: {source}")]
    Storage {
        key: CacheKey,
        #[source]
        source: StoreError,
    },

    #[error("failed to clear cache: {source}")]
    Clear {
        #[source]
        source: StoreError,
    },

    #[error("failed to encode cache entry for {key}: {source}")]
    Encode {
        key: CacheKey,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-key diagnostic snapshot, consumed by the cache debug screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyStats {
    pub exists: bool,
    pub age_minutes: Option<i64>,
    pub expired: Option<bool>,
    pub size_bytes: Option<usize>,
}

/// TTL-governed key/value cache over a persistent store.
///
/// Reads are advisory: any storage failure or corrupt entry degrades to a
/// miss so cache trouble can never block the application. Writes surface
/// their errors, letting callers decide whether a fetched value counts as
/// cached for this cycle.
///
/// Clone is cheap - the backing store is behind an `Arc`.
#[derive(Clone)]
pub struct CacheStore {
    store: Arc<dyn KeyValueStore>,
    policy: ExpiryPolicy,
}

impl CacheStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            policy: ExpiryPolicy::new(),
        }
    }

    pub fn with_policy(store: Arc<dyn KeyValueStore>, policy: ExpiryPolicy) -> Self {
        Self { store, policy }
    }

    /// Cache a value under `key` with the policy's default expiry.
    /// Overwrites unconditionally - last writer wins.
    pub async fn set<T: Serialize>(&self, key: CacheKey, value: &T) -> Result<(), CacheError> {
        self.set_with_expiry(key, value, self.policy.expiry_for(key))
            .await
    }

    /// Cache a value with an explicit validity window.
    pub async fn set_with_expiry<T: Serialize>(
        &self,
        key: CacheKey,
        value: &T,
        expiry: Duration,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry::new(value, expiry);
        let raw = serde_json::to_string(&entry)
            .map_err(|source| CacheError::Encode { key, source })?;
        self.store
            .set(key.as_str(), &raw)
            .await
            .map_err(|source| CacheError::Storage { key, source })?;
        debug!(key = %key, bytes = raw.len(), "Cached entry");
        Ok(())
    }

    /// Read a value, `None` on miss, expiry, corruption, or storage failure.
    ///
    /// An expired or unparseable entry is deleted on the way out (best
    /// effort - a failed delete is logged, not surfaced). This is the only
    /// eviction the cache performs; there is no background sweep.
    pub async fn get<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        let raw = match self.store.get(key.as_str()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed; treating as miss");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupt cache entry; discarding");
                self.evict(key).await;
                return None;
            }
        };

        if entry.is_expired() {
            debug!(key = %key, age_minutes = entry.age_minutes(), "Cache entry expired");
            self.evict(key).await;
            return None;
        }

        debug!(key = %key, "Cache hit");
        Some(entry.data)
    }

    /// Best-effort delete used by the read path.
    async fn evict(&self, key: CacheKey) {
        if let Err(e) = self.store.remove(key.as_str()).await {
            debug!(key = %key, error = %e, "Failed to evict entry");
        }
    }

    /// Delete one key. Idempotent - removing an absent key succeeds.
    pub async fn remove(&self, key: CacheKey) -> Result<(), CacheError> {
        self.store
            .remove(key.as_str())
            .await
            .map_err(|source| CacheError::Storage { key, source })?;
        debug!(key = %key, "Removed cache entry");
        Ok(())
    }

    /// Delete every known key in one batch. Used for logout and
    /// "reset app data".
    pub async fn clear_all(&self) -> Result<(), CacheError> {
        let keys: Vec<&str> = CacheKey::ALL.iter().map(|k| k.as_str()).collect();
        self.store
            .remove_many(&keys)
            .await
            .map_err(|source| CacheError::Clear { source })?;
        debug!("Cleared all cache entries");
        Ok(())
    }

    /// Diagnostic snapshot over every known key. Never fails; an entry
    /// that cannot be read or parsed reports `exists: false`.
    pub async fn stats(&self) -> HashMap<CacheKey, KeyStats> {
        let mut stats = HashMap::new();
        for key in CacheKey::ALL {
            stats.insert(key, self.key_stats(key).await);
        }
        stats
    }

    async fn key_stats(&self, key: CacheKey) -> KeyStats {
        let raw = match self.store.get(key.as_str()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return KeyStats::default(),
            Err(e) => {
                debug!(key = %key, error = %e, "Stats read failed");
                return KeyStats::default();
            }
        };
        match serde_json::from_str::<CacheEntry<serde_json::Value>>(&raw) {
            Ok(entry) => KeyStats {
                exists: true,
                age_minutes: Some(entry.age_minutes()),
                expired: Some(entry.is_expired()),
                size_bytes: Some(raw.len()),
            },
            Err(e) => {
                debug!(key = %key, error = %e, "Stats parse failed");
                KeyStats::default()
            }
        }
    }

    // ===== Tournaments =====

    pub async fn save_tournaments(&self, tournaments: &[Tournament]) -> Result<(), CacheError> {
        self.set(CacheKey::Tournaments, &tournaments).await
    }

    pub async fn load_tournaments(&self) -> Option<Vec<Tournament>> {
        self.get(CacheKey::Tournaments).await
    }

    pub async fn save_upcoming_tournaments(
        &self,
        tournaments: &[Tournament],
    ) -> Result<(), CacheError> {
        self.set(CacheKey::UpcomingTournaments, &tournaments).await
    }

    pub async fn load_upcoming_tournaments(&self) -> Option<Vec<Tournament>> {
        self.get(CacheKey::UpcomingTournaments).await
    }

    // ===== Messages =====

    pub async fn save_messages(&self, messages: &[Message]) -> Result<(), CacheError> {
        self.set(CacheKey::Messages, &messages).await
    }

    pub async fn load_messages(&self) -> Option<Vec<Message>> {
        self.get(CacheKey::Messages).await
    }

    // ===== Profile =====

    pub async fn save_user_profile(&self, profile: &Player) -> Result<(), CacheError> {
        self.set(CacheKey::UserProfile, profile).await
    }

    pub async fn load_user_profile(&self) -> Option<Player> {
        self.get(CacheKey::UserProfile).await
    }

    // ===== App settings =====

    pub async fn save_app_settings(&self, settings: &AppSettings) -> Result<(), CacheError> {
        self.set(CacheKey::AppSettings, settings).await
    }

    pub async fn load_app_settings(&self) -> Option<AppSettings> {
        self.get(CacheKey::AppSettings).await
    }
}
