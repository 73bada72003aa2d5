//! Session persistence across app restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{CacheError, CacheKey, CacheStore};
use crate::models::{AuthTokens, Player};

/// The authenticated principal, persisted as one cache entry.
///
/// The session's TTL comes from the cache policy for `user_session`
/// (7 days); a session older than that reads back as absent, which is
/// how "logged out by inactivity" happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: Player,
    pub tokens: AuthTokens,
    #[serde(rename = "loginTime")]
    pub login_time: DateTime<Utc>,
}

/// Saves, restores, and clears the persisted session.
///
/// Owns session identity semantics; storage is delegated to the injected
/// `CacheStore`. Token refresh is the API collaborator's job - it calls
/// `save` again with the new tokens.
#[derive(Clone)]
pub struct SessionManager {
    cache: CacheStore,
}

/// Cache entries that are meaningless without a session and are removed
/// alongside it on logout.
const DEPENDENT_KEYS: [CacheKey; 2] = [CacheKey::UserProfile, CacheKey::Messages];

impl SessionManager {
    pub fn new(cache: CacheStore) -> Self {
        Self { cache }
    }

    /// Persist a freshly authenticated session with `login_time = now`.
    pub async fn save(&self, user: Player, tokens: AuthTokens) -> Result<(), CacheError> {
        let session = Session {
            user,
            tokens,
            login_time: Utc::now(),
        };
        self.cache.set(CacheKey::UserSession, &session).await?;
        info!(user = %session.user.username, "Session saved");
        Ok(())
    }

    /// Restore the session from storage.
    ///
    /// `None` means logged out: nothing persisted, or the entry aged past
    /// its TTL (the cache evicts it on this read).
    pub async fn restore(&self) -> Option<Session> {
        let session: Option<Session> = self.cache.get(CacheKey::UserSession).await;
        match &session {
            Some(s) => debug!(user = %s.user.username, "Session restored"),
            None => debug!("No session to restore"),
        }
        session
    }

    /// Whether a live session exists.
    pub async fn is_authenticated(&self) -> bool {
        self.restore().await.is_some()
    }

    /// Remove the session and every cache entry that depends on it.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.cache.remove(CacheKey::UserSession).await?;
        for key in DEPENDENT_KEYS {
            self.cache.remove(key).await?;
        }
        info!("Session cleared");
        Ok(())
    }
}
