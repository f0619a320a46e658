#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the railway operations server.
//!
//! Every endpoint answers with the [`ApiResponse`] envelope. Request
//! bodies keep every field optional so that missing required values can be
//! reported as a 400 with a useful message instead of a generic
//! deserialization failure.

use chrono::{DateTime, Utc};
use railway_ops_models::{
    AlertSeverity, AlertType, Conflict, Recommendation, TrainStatus, WeatherSnapshot,
};
use serde::{Deserialize, Serialize};

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Informational message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Number of items in `data` when it is a list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// When the payload was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            count: None,
            timestamp: None,
        }
    }

    /// Attaches a production timestamp.
    #[must_use]
    pub const fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// A successful response carrying a list and its length.
    #[must_use]
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self {
            count: Some(count),
            ..Self::ok(items)
        }
    }
}

impl ApiResponse<()> {
    /// A successful response with only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: Some(message.into()),
            count: None,
            timestamp: None,
        }
    }

    /// A failed response.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
            count: None,
            timestamp: None,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Body of a request that only names an action.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionBody {
    /// Requested action, e.g. `refresh`.
    pub action: Option<String>,
}

/// Query parameters for `GET /api/trains`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainQuery {
    /// Single train id.
    pub id: Option<String>,
    /// Service class label, e.g. `EMU`.
    #[serde(rename = "type")]
    pub train_type: Option<String>,
    /// Station code served by the route.
    pub station: Option<String>,
}

/// Body of `PUT /api/trains`. Any subset of the update fields may be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrainBody {
    /// Train to update.
    pub train_id: Option<String>,
    /// New status label.
    pub status: Option<TrainStatus>,
    /// New delay in minutes.
    pub delay: Option<u32>,
    /// Station the train has reached.
    pub station_code: Option<String>,
    /// New priority; clamped into `1..=10`.
    pub priority: Option<i64>,
    /// New platform; an empty string clears it.
    pub platform: Option<String>,
}

impl UpdateTrainBody {
    /// Whether any update field is present.
    #[must_use]
    pub const fn has_updates(&self) -> bool {
        self.status.is_some()
            || self.delay.is_some()
            || self.station_code.is_some()
            || self.priority.is_some()
            || self.platform.is_some()
    }
}

/// `GET /api/weather` payload: the snapshot plus derived fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherResponse {
    /// The current snapshot, flattened into this object.
    #[serde(flatten)]
    pub snapshot: WeatherSnapshot,
    /// Operational meaning of the current weather.
    pub impact_description: String,
    /// Line speed restriction in km/h.
    pub speed_restriction: u32,
    /// When the snapshot was last regenerated.
    pub last_update: DateTime<Utc>,
}

/// Query parameters for `GET /api/safety`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyQuery {
    /// Single alert id.
    pub id: Option<String>,
    /// Alert type label.
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    /// Severity label.
    pub severity: Option<String>,
    /// `true` runs a check pass before answering.
    pub run_check: Option<String>,
}

impl SafetyQuery {
    /// Whether the caller asked for a check pass.
    #[must_use]
    pub fn wants_check(&self) -> bool {
        self.run_check.as_deref() == Some("true")
    }
}

/// Body of `POST /api/safety`: an action and/or raw alert fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyPostBody {
    /// `create` or `run-check`; absent means create.
    pub action: Option<String>,
    /// Alert category.
    #[serde(rename = "type")]
    pub alert_type: Option<AlertType>,
    /// Alert severity.
    pub severity: Option<AlertSeverity>,
    /// Short title.
    pub title: Option<String>,
    /// Details.
    pub description: Option<String>,
    /// Ids of the trains involved.
    pub affected_trains: Option<Vec<String>>,
    /// Codes of the stations involved.
    pub affected_stations: Option<Vec<String>>,
}

/// Body of `PATCH /api/safety`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveAlertBody {
    /// Alert to resolve.
    pub alert_id: Option<String>,
    /// Absent or `resolve`.
    pub action: Option<String>,
}

/// Query parameters for `GET /api/stations`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationQuery {
    /// Single station code.
    pub code: Option<String>,
}

/// Query parameters for `GET /api/ai`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiQuery {
    /// `conflicts`, `weather-recommendations` or `priority-optimization`.
    pub action: Option<String>,
    /// Recommendation type filter.
    #[serde(rename = "type")]
    pub recommendation_type: Option<String>,
    /// Recommendation or conflict id.
    pub id: Option<String>,
    /// Conflict type filter, used with `action=conflicts`.
    pub conflict_type: Option<String>,
}

/// A what-if scenario as submitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioBody {
    /// Train to change.
    pub train_id: Option<String>,
    /// Replacement priority.
    pub new_priority: Option<i64>,
    /// Replacement route.
    pub new_route: Option<Vec<String>>,
    /// Minutes added to the delay.
    pub delay_minutes: Option<i64>,
}

/// Body of `POST /api/ai`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiPostBody {
    /// `what-if-analysis` or `refresh`.
    pub action: Option<String>,
    /// Required for `what-if-analysis`.
    pub scenario: Option<ScenarioBody>,
}

/// Result of `POST /api/ai` with `action=refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiRefreshResponse {
    /// Recommendations from the new pass.
    pub recommendations: Vec<Recommendation>,
    /// Conflicts from the new pass.
    pub conflicts: Vec<Conflict>,
}

/// Body of `POST /api/metrics`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsPostBody {
    /// Only `historical` is supported.
    pub action: Option<String>,
    /// Hours of history; defaults to 24.
    pub time_range: Option<u32>,
}
