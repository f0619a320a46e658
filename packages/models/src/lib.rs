#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared domain types for the railway operations dashboard.
//!
//! Every component (train registry, weather generator, safety monitor,
//! analysis engine, HTTP surface) speaks in terms of these records. They
//! serialize to the camelCase JSON shape consumed by the dashboard UI, and
//! enum values serialize as their human-readable labels (`"On Time"`,
//! `"Heavy Rain"`, `"EMU"`).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Lowest priority a train may carry.
pub const MIN_PRIORITY: u8 = 1;

/// Highest priority a train may carry.
pub const MAX_PRIORITY: u8 = 10;

/// Clamps an arbitrary priority value into the valid `1..=10` range.
#[must_use]
pub fn clamp_priority(value: i64) -> u8 {
    let clamped = value.clamp(i64::from(MIN_PRIORITY), i64::from(MAX_PRIORITY));
    u8::try_from(clamped).unwrap_or(MIN_PRIORITY)
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

/// A station on the corridor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// Identifier (same as `code` for every configured station).
    pub id: String,
    /// Unique station code, e.g. `MAS`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Number of platforms.
    pub platforms: u32,
    /// Station location.
    pub coordinates: Coordinates,
    /// Distance from the origin station in km.
    pub distance: f64,
}

/// Service class of a train.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum TrainType {
    /// Suburban electric multiple unit (local service).
    #[serde(rename = "EMU")]
    #[strum(serialize = "EMU")]
    Emu,
    /// Long-distance express.
    Express,
    /// Superfast express.
    Superfast,
    /// Goods train, carries no passengers.
    Freight,
}

impl TrainType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Emu, Self::Express, Self::Superfast, Self::Freight]
    }

    /// Seats used when estimating passenger counts, if the type is counted.
    #[must_use]
    pub const fn passenger_capacity(self) -> Option<u32> {
        match self {
            Self::Emu => Some(1200),
            Self::Express => Some(800),
            Self::Superfast | Self::Freight => None,
        }
    }
}

/// Running status of a train.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum TrainStatus {
    /// Running to schedule.
    #[serde(rename = "On Time")]
    #[strum(serialize = "On Time")]
    OnTime,
    /// Running late.
    Delayed,
    /// Service cancelled.
    Cancelled,
    /// Already left its current station.
    Departed,
}

/// A train tracked by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    /// Unique identifier, e.g. `EMU-001`.
    pub id: String,
    /// Public train number.
    pub number: String,
    /// Display name.
    pub name: String,
    /// Service class.
    #[serde(rename = "type")]
    pub train_type: TrainType,
    /// Running status.
    pub status: TrainStatus,
    /// Code of the station the train is at (or last passed).
    pub current_station: String,
    /// Code of the next station on the route.
    pub next_station: String,
    /// Current speed in km/h.
    pub speed: u32,
    /// Delay in minutes.
    pub delay: u32,
    /// Occupancy as a percentage of capacity.
    pub passenger_load: u32,
    /// Assigned platform at the current station.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Expected arrival as a 24h `HH:MM` clock string.
    pub estimated_arrival: String,
    /// Expected departure as a 24h `HH:MM` clock string.
    pub estimated_departure: String,
    /// Ordered station codes served by this train.
    pub route: Vec<String>,
    /// Scheduling priority, 1 (lowest) to 10 (highest).
    pub priority: u8,
    /// Current position.
    pub coordinates: Coordinates,
}

impl Train {
    /// Whether the train touches `station_code` as its current or next
    /// stop or anywhere along its route.
    #[must_use]
    pub fn serves(&self, station_code: &str) -> bool {
        self.current_station == station_code
            || self.next_station == station_code
            || self.route.iter().any(|code| code == station_code)
    }
}

/// Weather conditions the generator can produce.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum WeatherCondition {
    /// Clear skies.
    Clear,
    /// Partly cloudy.
    #[serde(rename = "Partly Cloudy")]
    #[strum(serialize = "Partly Cloudy")]
    PartlyCloudy,
    /// Overcast.
    Cloudy,
    /// Light rain.
    #[serde(rename = "Light Rain")]
    #[strum(serialize = "Light Rain")]
    LightRain,
    /// Heavy rain.
    #[serde(rename = "Heavy Rain")]
    #[strum(serialize = "Heavy Rain")]
    HeavyRain,
    /// Fog, reduces visibility below 2.5 km.
    Fog,
    /// Thunderstorm.
    Thunderstorm,
}

impl WeatherCondition {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Clear,
            Self::PartlyCloudy,
            Self::Cloudy,
            Self::LightRain,
            Self::HeavyRain,
            Self::Fog,
            Self::Thunderstorm,
        ]
    }
}

/// Operational impact of the current weather.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum WeatherImpact {
    /// No restrictions.
    Normal,
    /// Reduced speed, monitor conditions.
    Caution,
    /// Severe restrictions.
    Restricted,
}

impl WeatherImpact {
    /// Maximum permitted line speed in km/h under this impact level.
    #[must_use]
    pub const fn speed_restriction(self) -> u32 {
        match self {
            Self::Restricted => 25,
            Self::Caution => 50,
            Self::Normal => 120,
        }
    }
}

/// The current weather over the corridor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// Temperature in degrees Celsius.
    pub temperature: i32,
    /// Condition label.
    pub condition: WeatherCondition,
    /// Visibility in km, one decimal place.
    pub visibility: f64,
    /// Wind speed in km/h.
    pub wind_speed: u32,
    /// Relative humidity in percent.
    pub humidity: u32,
    /// Derived operational impact.
    pub impact: WeatherImpact,
}

/// Category of a safety alert.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum AlertType {
    /// Weather related.
    Weather,
    /// Planned or unplanned maintenance.
    Maintenance,
    /// Signalling and speed compliance.
    Signal,
    /// Track and platform occupancy.
    Track,
    /// Emergency.
    Emergency,
}

/// Severity of a safety alert.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum AlertSeverity {
    /// Informational.
    Low,
    /// Needs attention.
    Medium,
    /// Needs prompt action.
    High,
    /// Needs immediate action.
    Critical,
}

/// A safety alert raised by the monitor or an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAlert {
    /// Unique identifier.
    pub id: String,
    /// Alert category.
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Alert severity.
    pub severity: AlertSeverity,
    /// Short title, also used for deduplication together with the type.
    pub title: String,
    /// Human-readable details.
    pub description: String,
    /// Ids of the trains involved.
    pub affected_trains: Vec<String>,
    /// Codes of the stations involved.
    pub affected_stations: Vec<String>,
    /// When the alert was raised.
    pub timestamp: DateTime<Utc>,
    /// Whether an operator has resolved the alert.
    pub resolved: bool,
}

/// Kind of scheduling conflict.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ConflictType {
    /// Two or more trains on one platform.
    Platform,
    /// Two or more trains on one track segment within a short window.
    Track,
    /// Signalling conflict.
    Signal,
    /// Two or more trains due at one station at the same minute.
    Timing,
}

/// A detected scheduling conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    /// Identifier, unique within one detection pass.
    pub id: String,
    /// Conflict kind.
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    /// Ids of the trains involved.
    pub trains: Vec<String>,
    /// Station where the conflict occurs.
    pub station: String,
    /// Human-readable details.
    pub description: String,
    /// Suggested way to resolve the conflict.
    pub suggested_resolution: String,
    /// Urgency, 1 to 10.
    pub priority: u8,
    /// When the conflict was detected.
    pub timestamp: DateTime<Utc>,
}

impl Conflict {
    /// Identity of a conflict independent of its per-pass id: the kind,
    /// the station, and the sorted participant ids.
    #[must_use]
    pub fn signature(&self) -> (ConflictType, String, Vec<String>) {
        let mut trains = self.trains.clone();
        trains.sort_unstable();
        (self.conflict_type, self.station.clone(), trains)
    }
}

/// Kind of operational recommendation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RecommendationType {
    /// Priority changes.
    Priority,
    /// Routing or speed changes.
    Route,
    /// Platform allocation changes.
    Platform,
    /// Delay handling.
    Delay,
}

/// A rule-based operational recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Identifier, unique within one generation pass.
    pub id: String,
    /// Recommendation kind.
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    /// Short title.
    pub title: String,
    /// What to do.
    pub description: String,
    /// Expected effect.
    pub impact: String,
    /// Confidence in percent (0-100).
    pub confidence: u8,
    /// Ids of the trains the recommendation applies to.
    pub affected_trains: Vec<String>,
    /// When the recommendation was generated.
    pub timestamp: DateTime<Utc>,
}

/// Weather portion of the metrics breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherBreakdown {
    /// Current condition.
    pub condition: WeatherCondition,
    /// Current impact level.
    pub impact: WeatherImpact,
    /// Speed restriction in km/h.
    pub speed_restriction: u32,
}

/// Analysis portion of the metrics breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiBreakdown {
    /// Recommendations in the last pass.
    pub recommendations: usize,
    /// Conflicts in the last pass.
    pub conflicts: usize,
    /// Conflicts with priority 8 or higher.
    pub critical_conflicts: usize,
}

/// Aggregate dashboard metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    /// Trains that are not cancelled.
    pub active_trains: usize,
    /// Percentage of trains delayed by at most 5 minutes.
    pub on_time_performance: u32,
    /// Unresolved alerts.
    pub active_alerts: usize,
    /// Estimated passengers on board passenger services.
    pub passengers_today: u64,
    /// Mean delay in minutes, rounded.
    pub average_delay: u32,
    /// Platform utilization in percent.
    pub platform_utilization: u32,
    /// Weather breakdown.
    pub weather: WeatherBreakdown,
    /// Analysis breakdown.
    pub ai: AiBreakdown,
    /// Train counts keyed by type label.
    pub train_types: BTreeMap<String, usize>,
}

/// One synthetic sample of a historical metrics series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPoint {
    /// Start of the sampled hour.
    pub timestamp: DateTime<Utc>,
    /// On-time performance in percent.
    pub on_time_performance: u32,
    /// Mean delay in minutes.
    pub average_delay: u32,
    /// Active trains.
    pub active_trains: u32,
    /// Passengers carried.
    pub passengers: u64,
    /// Alerts raised.
    pub alerts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_priority_bounds() {
        assert_eq!(clamp_priority(-4), 1);
        assert_eq!(clamp_priority(0), 1);
        assert_eq!(clamp_priority(7), 7);
        assert_eq!(clamp_priority(11), 10);
        assert_eq!(clamp_priority(i64::MAX), 10);
    }

    #[test]
    fn speed_restriction_per_impact() {
        assert_eq!(WeatherImpact::Restricted.speed_restriction(), 25);
        assert_eq!(WeatherImpact::Caution.speed_restriction(), 50);
        assert_eq!(WeatherImpact::Normal.speed_restriction(), 120);
    }

    #[test]
    fn enum_labels_parse_and_display() {
        for train_type in TrainType::all() {
            let parsed: TrainType = train_type.to_string().parse().unwrap();
            assert_eq!(parsed, *train_type);
        }
        assert_eq!(TrainStatus::OnTime.to_string(), "On Time");
        assert_eq!("Heavy Rain".parse::<WeatherCondition>().unwrap(), WeatherCondition::HeavyRain);
        assert!("Tornado".parse::<WeatherCondition>().is_err());
    }

    #[test]
    fn serde_uses_display_labels() {
        assert_eq!(serde_json::to_string(&TrainType::Emu).unwrap(), "\"EMU\"");
        assert_eq!(
            serde_json::to_string(&TrainStatus::OnTime).unwrap(),
            "\"On Time\""
        );
        assert_eq!(
            serde_json::to_string(&WeatherCondition::PartlyCloudy).unwrap(),
            "\"Partly Cloudy\""
        );
    }

    #[test]
    fn conflict_signature_ignores_id_and_order() {
        let now = Utc::now();
        let a = Conflict {
            id: "CONF-A".to_string(),
            conflict_type: ConflictType::Platform,
            trains: vec!["EXP-001".to_string(), "EMU-001".to_string()],
            station: "MAS".to_string(),
            description: String::new(),
            suggested_resolution: String::new(),
            priority: 5,
            timestamp: now,
        };
        let b = Conflict {
            id: "CONF-B".to_string(),
            trains: vec!["EMU-001".to_string(), "EXP-001".to_string()],
            ..a.clone()
        };
        assert_eq!(a.signature(), b.signature());
    }
}
