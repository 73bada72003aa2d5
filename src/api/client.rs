//! API client for communicating with the PickleZone REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests to fetch player, tournament, and message data. The cache layer
//! never calls it directly - callers wrap these methods in fetch closures
//! and hand them to the `SyncCoordinator`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{
    AuthTokens, LoginResponse, MessagesResponse, Player, ProfileResponse, Tournament,
    TournamentsResponse,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the PickleZone API
const DEFAULT_BASE_URL: &str = "https://www.malaysiapickleball.my/api";

/// HTTP request timeout in seconds.
/// Mobile connections are slow to fail on their own; 15s keeps the UI
/// responsive while the coordinator falls back to cached data.
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// API client for PickleZone.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<Arc<String>>,
}

impl ApiClient {
    /// Create a new API client against the default base URL.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Create a client against a custom base URL (staging, tests).
    pub fn with_base_url(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(Arc::new(token));
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(Arc::new(token)),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer_token(&self) -> Result<&str, ApiError> {
        self.token
            .as_deref()
            .map(|t| t.as_str())
            .ok_or(ApiError::NotAuthenticated)
    }

    /// Map non-success statuses to the error taxonomy.
    async fn check_response(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body).into())
    }

    async fn get_authed(&self, path: &str) -> Result<Response> {
        let token = self.bearer_token()?;
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Request failed: GET {}", path))?;
        Self::check_response(response).await
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Authenticate and return the player plus issued tokens.
    ///
    /// The caller persists these through `SessionManager::save`.
    pub async fn login(&self, username: &str, password: &str) -> Result<(Player, AuthTokens)> {
        let response = self
            .client
            .post(self.url("/auth/player/login"))
            .json(&LoginRequest {
                username: username.trim(),
                password,
            })
            .send()
            .await
            .context("Failed to send login request")?;

        let response = Self::check_response(response).await?;
        let login: LoginResponse = response
            .json()
            .await
            .context("Failed to parse login response")?;

        if !login.success {
            return Err(anyhow!(login
                .message
                .unwrap_or_else(|| "Login failed".to_string())));
        }

        let user = login.user.ok_or(ApiError::InvalidResponse(
            "Login response missing user".to_string(),
        ))?;
        let access_token = login.token.ok_or(ApiError::InvalidResponse(
            "Login response missing token".to_string(),
        ))?;

        debug!(username = %user.username, "Login successful");
        Ok((
            user,
            AuthTokens {
                access_token,
                refresh_token: login.refresh_token,
            },
        ))
    }

    /// Tell the server to invalidate the session.
    ///
    /// Failure is tolerated - local logout proceeds regardless, so a dead
    /// network cannot trap the user in a logged-in state.
    pub async fn logout(&self) {
        let Ok(token) = self.bearer_token() else {
            return;
        };
        let result = self
            .client
            .post(self.url("/auth/player/logout"))
            .bearer_auth(token)
            .send()
            .await;
        if let Err(e) = result {
            warn!(error = %e, "Logout request failed; continuing with local logout");
        }
    }

    // ========================================================================
    // Player data
    // ========================================================================

    /// Fetch the authenticated player's profile.
    pub async fn fetch_profile(&self) -> Result<Player> {
        let response = self.get_authed("/mobile/player/me").await?;
        let profile: ProfileResponse = response
            .json()
            .await
            .context("Failed to parse profile response")?;

        profile
            .player
            .ok_or_else(|| {
                anyhow!(profile
                    .message
                    .unwrap_or_else(|| "Profile response missing player".to_string()))
            })
    }

    /// Fetch the player's inbox.
    pub async fn fetch_messages(&self) -> Result<MessagesResponse> {
        let response = self.get_authed("/mobile/player/messages").await?;
        response
            .json()
            .await
            .context("Failed to parse messages response")
    }

    // ========================================================================
    // Tournaments
    // ========================================================================

    /// Fetch the full tournament list.
    pub async fn fetch_tournaments(&self) -> Result<Vec<Tournament>> {
        let response = self.get_authed("/mobile/tournaments").await?;
        let list: TournamentsResponse = response
            .json()
            .await
            .context("Failed to parse tournaments response")?;
        debug!(count = list.tournaments.len(), "Tournaments fetched");
        Ok(list.tournaments)
    }

    /// Fetch only tournaments that have not started yet.
    pub async fn fetch_upcoming_tournaments(&self) -> Result<Vec<Tournament>> {
        let response = self.get_authed("/tournaments/upcoming").await?;
        let list: TournamentsResponse = response
            .json()
            .await
            .context("Failed to parse upcoming tournaments response")?;
        Ok(list.tournaments)
    }

    // ========================================================================
    // Utility
    // ========================================================================

    /// Whether the API is reachable. Does not require authentication.
    pub async fn health_check(&self) -> bool {
        match self.client.get(self.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_path() {
        let client = ApiClient::with_base_url("https://api.test".to_string()).unwrap();
        assert_eq!(client.url("/health"), "https://api.test/health");
    }

    #[tokio::test]
    async fn test_authed_request_without_token_fails_fast() {
        let client = ApiClient::with_base_url("https://api.test".to_string()).unwrap();
        let err = client.fetch_profile().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_with_token_keeps_base_url() {
        let client = ApiClient::with_base_url("https://api.test".to_string()).unwrap();
        let authed = client.with_token("jwt".to_string());
        assert_eq!(authed.url("/x"), "https://api.test/x");
        assert!(authed.bearer_token().is_ok());
    }
}
