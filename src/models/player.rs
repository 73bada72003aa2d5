use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered player account as returned by the PickleZone API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub id: i64,
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "profilePictureUrl")]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub ranking: Option<i64>,
}

impl Player {
    /// Display name for UI labels: full name when present, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.username)
    }
}

/// Bearer tokens issued at login.
///
/// The refresh token is optional - the API only issues one for
/// "remember me" logins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthTokens {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// Response from the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    pub user: Option<Player>,
    pub token: Option<String>,
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
    pub message: Option<String>,
}

/// Response wrapper from the profile endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub success: bool,
    pub player: Option<Player>,
    pub message: Option<String>,
}

/// Opaque application settings blob.
///
/// Settings are written by the settings screen and only pass through this
/// layer; the cache does not interpret them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(rename = "pushEnabled", default)]
    pub push_enabled: bool,
    pub language: Option<String>,
    #[serde(rename = "lastOpenedAt")]
    pub last_opened_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_full_name() {
        let player = Player {
            id: 1,
            username: "amin92".to_string(),
            full_name: Some("Amin Rashid".to_string()),
            email: None,
            phone: None,
            profile_picture_url: None,
            ranking: None,
        };
        assert_eq!(player.display_name(), "Amin Rashid");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let player = Player {
            id: 1,
            username: "amin92".to_string(),
            full_name: Some(String::new()),
            email: None,
            phone: None,
            profile_picture_url: None,
            ranking: None,
        };
        assert_eq!(player.display_name(), "amin92");
    }
}
