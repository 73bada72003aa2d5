//! PickleZone core - the data layer behind the PickleZone mobile client.
//!
//! This crate owns the local cache and synchronization layer: a persistent,
//! TTL-governed key/value cache (`cache`), session persistence across app
//! restarts (`auth`), and the get-or-fetch coordinator that decides whether
//! to serve cached data or hit the network (`sync`). The thin `api` client
//! and the `models` it exchanges sit alongside as collaborators.
//!
//! The contract the rest of the app relies on: ask the `SyncCoordinator`
//! for a resource and get back the best available value plus where it came
//! from. Storage trouble degrades to a cache miss, network trouble degrades
//! to last-known-good data; nothing in this crate is fatal to the app.
//!
//! ```no_run
//! use std::sync::Arc;
//! use picklezone_core::cache::{CacheKey, CacheStore, FileStore};
//! use picklezone_core::sync::SyncCoordinator;
//! use picklezone_core::api::ApiClient;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = picklezone_core::config::Config::load()?;
//! let store = Arc::new(FileStore::new(config.cache_dir()?)?);
//! let cache = CacheStore::new(store);
//! let sync = SyncCoordinator::new(cache);
//!
//! let api = ApiClient::new()?.with_token("jwt".to_string());
//! let tournaments = sync
//!     .get_or_fetch(
//!         CacheKey::Tournaments,
//!         || async move { api.fetch_tournaments().await },
//!         false,
//!     )
//!     .await?;
//! println!(
//!     "{} tournaments ({})",
//!     tournaments.data.len(),
//!     if tournaments.from_cache() { "cached" } else { "live" }
//! );
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod sync;

pub use api::{ApiClient, ApiError};
pub use auth::{Session, SessionManager};
pub use cache::{CacheError, CacheKey, CacheStore, ExpiryPolicy, FileStore, MemoryStore};
pub use sync::{DataSource, RefreshTask, SyncCoordinator, SyncError, SyncResult};
