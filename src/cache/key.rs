//! Cache keys and expiry policy.
//!
//! Every logical resource the cache manages has exactly one slot, identified
//! by a `CacheKey`. The set is closed: adding a resource means adding a
//! variant here, which keeps `clear_all` and `stats` exhaustive.

use std::collections::HashMap;

use chrono::Duration;

/// Sessions persist for 7 days before the user must log in again.
const SESSION_EXPIRY_DAYS: i64 = 7;

/// Profile data changes rarely; 24 hours keeps it current enough.
const PROFILE_EXPIRY_HOURS: i64 = 24;

/// Tournament listings update on the order of hours.
const TOURNAMENTS_EXPIRY_HOURS: i64 = 1;

/// Upcoming tournaments are more time-sensitive than the full list.
const UPCOMING_EXPIRY_MINUTES: i64 = 30;

/// Inbox messages are the most volatile cached resource.
const MESSAGES_EXPIRY_MINUTES: i64 = 5;

/// App settings only change when the user edits them.
const SETTINGS_EXPIRY_DAYS: i64 = 30;

/// The sync registry must outlive every data TTL; entries are only
/// replaced by successful fetches, never aged out.
const REGISTRY_EXPIRY_DAYS: i64 = 365;

/// Fallback for keys without a dedicated policy entry.
const DEFAULT_EXPIRY_HOURS: i64 = 1;

/// Logical resources managed by the cache layer.
///
/// The string forms are used verbatim as storage keys and must stay stable
/// across releases - changing one orphans the persisted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    UserSession,
    UserProfile,
    Tournaments,
    UpcomingTournaments,
    Messages,
    LastSync,
    AppSettings,
}

impl CacheKey {
    /// Every key, in a fixed order. Used by `clear_all` and `stats`.
    pub const ALL: [CacheKey; 7] = [
        CacheKey::UserSession,
        CacheKey::UserProfile,
        CacheKey::Tournaments,
        CacheKey::UpcomingTournaments,
        CacheKey::Messages,
        CacheKey::LastSync,
        CacheKey::AppSettings,
    ];

    /// The storage key this resource is persisted under.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::UserSession => "user_session",
            CacheKey::UserProfile => "user_profile",
            CacheKey::Tournaments => "tournaments",
            CacheKey::UpcomingTournaments => "upcoming_tournaments",
            CacheKey::Messages => "messages",
            CacheKey::LastSync => "last_sync",
            CacheKey::AppSettings => "app_settings",
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default time-to-live per cache key, overridable per key and per call.
///
/// The defaults encode how quickly each resource goes stale; callers that
/// know better pass an explicit expiry to `CacheStore::set_with_expiry`.
#[derive(Debug, Clone)]
pub struct ExpiryPolicy {
    overrides: HashMap<CacheKey, Duration>,
}

impl ExpiryPolicy {
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }

    /// Replace the default expiry for one key.
    pub fn with_expiry(mut self, key: CacheKey, expiry: Duration) -> Self {
        self.overrides.insert(key, expiry);
        self
    }

    /// The effective expiry for a key.
    pub fn expiry_for(&self, key: CacheKey) -> Duration {
        if let Some(d) = self.overrides.get(&key) {
            return *d;
        }
        match key {
            CacheKey::UserSession => Duration::days(SESSION_EXPIRY_DAYS),
            CacheKey::UserProfile => Duration::hours(PROFILE_EXPIRY_HOURS),
            CacheKey::Tournaments => Duration::hours(TOURNAMENTS_EXPIRY_HOURS),
            CacheKey::UpcomingTournaments => Duration::minutes(UPCOMING_EXPIRY_MINUTES),
            CacheKey::Messages => Duration::minutes(MESSAGES_EXPIRY_MINUTES),
            CacheKey::AppSettings => Duration::days(SETTINGS_EXPIRY_DAYS),
            CacheKey::LastSync => Duration::days(REGISTRY_EXPIRY_DAYS),
        }
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
