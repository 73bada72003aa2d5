//! REST API client module for the PickleZone service.
//!
//! This module provides the `ApiClient` for communicating with the
//! PickleZone API to fetch player, tournament, and message data.
//!
//! The API uses JWT bearer token authentication obtained through the
//! player login endpoint. The cache layer consumes these methods as
//! opaque fetch functions; it never constructs requests itself.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
