//! Data models for PickleZone entities.
//!
//! This module contains the data structures exchanged with the PickleZone
//! API and stored in the local cache:
//!
//! - `Player`, `AuthTokens`: account and credential data
//! - `Tournament`: tournament listings
//! - `Message`: inbox messages
//! - Response wrappers for the endpoints the `ApiClient` talks to
//!
//! The cache layer treats all of these as opaque serializable payloads.

pub mod message;
pub mod player;
pub mod tournament;

pub use message::{Message, MessagesResponse};
pub use player::{AppSettings, AuthTokens, LoginResponse, Player, ProfileResponse};
pub use tournament::{Tournament, TournamentsResponse};
