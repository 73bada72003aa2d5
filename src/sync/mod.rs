//! Synchronization between the local cache and the remote API.
//!
//! This module provides the `SyncCoordinator`, which owns the
//! fetch-vs-serve decision:
//!
//! - `get_or_fetch`: serve fresh cached data, or fetch and write through,
//!   with single-flight de-duplication of concurrent fetches
//! - `needs_refresh` / `last_sync`: the staleness registry that drives
//!   proactive background refresh
//! - `refresh_all`: settle-all bulk refresh that tolerates partial failure

pub mod coordinator;

pub use coordinator::{
    DataSource, RefreshTask, SyncCoordinator, SyncError, SyncRegistry, SyncResult,
};
