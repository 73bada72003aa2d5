use serde::{Deserialize, Serialize};

/// A tournament listing entry.
///
/// Dates arrive as strings in whatever format the API uses for the event;
/// this layer does not parse them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
}

/// Response wrapper from the tournament list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TournamentsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub tournaments: Vec<Tournament>,
    #[serde(default)]
    pub total: i64,
    pub message: Option<String>,
}
