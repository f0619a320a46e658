//! Individual safety rules.
//!
//! Each rule inspects the fleet and/or weather and returns candidate
//! alerts. Rules never touch the monitor's alert list; deduplication and
//! storage happen in [`crate::SafetyMonitor::run_safety_check`].

use std::collections::BTreeMap;

use railway_ops_models::{AlertSeverity, AlertType, Train, TrainStatus, WeatherImpact, WeatherSnapshot};

use crate::AlertDraft;

/// Delay (minutes) above which a train is reported.
pub const EXCESSIVE_DELAY_MINUTES: u32 = 30;

const RESTRICTED_WEATHER_STATIONS: &[&str] = &["MAS", "PER", "VLK", "KOK", "WST"];
const CAUTION_WEATHER_STATIONS: &[&str] = &["MAS", "PER", "VLK"];

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

fn all_ids(trains: &[Train]) -> Vec<String> {
    trains.iter().map(|t| t.id.clone()).collect()
}

/// Raises one fleet-wide alert while weather restricts operations.
#[must_use]
pub fn weather_compliance(weather: &WeatherSnapshot, trains: &[Train]) -> Vec<AlertDraft> {
    let speed = weather.impact.speed_restriction();
    match weather.impact {
        WeatherImpact::Restricted => vec![AlertDraft {
            alert_type: AlertType::Weather,
            severity: AlertSeverity::High,
            title: "Severe Weather Conditions".to_string(),
            description: format!(
                "{} with visibility {} km. Speed restricted to {speed} km/h.",
                weather.condition, weather.visibility
            ),
            affected_trains: all_ids(trains),
            affected_stations: codes(RESTRICTED_WEATHER_STATIONS),
        }],
        WeatherImpact::Caution => vec![AlertDraft {
            alert_type: AlertType::Weather,
            severity: AlertSeverity::Medium,
            title: "Weather Caution".to_string(),
            description: format!(
                "{}. Speed restricted to {speed} km/h. Monitor conditions.",
                weather.condition
            ),
            affected_trains: all_ids(trains),
            affected_stations: codes(CAUTION_WEATHER_STATIONS),
        }],
        WeatherImpact::Normal => Vec::new(),
    }
}

/// Flags every train running above the weather-derived speed limit.
#[must_use]
pub fn speed_compliance(trains: &[Train], max_speed: u32) -> Vec<AlertDraft> {
    trains
        .iter()
        .filter(|t| t.speed > max_speed)
        .map(|t| AlertDraft {
            alert_type: AlertType::Signal,
            severity: AlertSeverity::High,
            title: "Speed Limit Violation".to_string(),
            description: format!(
                "Train {} exceeding speed limit. Current: {} km/h, Max: {max_speed} km/h",
                t.number, t.speed
            ),
            affected_trains: vec![t.id.clone()],
            affected_stations: vec![t.current_station.clone()],
        })
        .collect()
}

/// Flags platforms held by more than one train that has not departed.
#[must_use]
pub fn platform_occupancy(trains: &[Train]) -> Vec<AlertDraft> {
    let mut occupancy: BTreeMap<(&str, &str), Vec<&Train>> = BTreeMap::new();
    for train in trains {
        if let Some(platform) = train.platform.as_deref()
            && !platform.is_empty()
            && train.status != TrainStatus::Departed
        {
            occupancy
                .entry((train.current_station.as_str(), platform))
                .or_default()
                .push(train);
        }
    }

    occupancy
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|((station, platform), group)| AlertDraft {
            alert_type: AlertType::Track,
            severity: AlertSeverity::Critical,
            title: "Platform Conflict".to_string(),
            description: format!("Multiple trains assigned to {station} Platform {platform}"),
            affected_trains: group.iter().map(|t| t.id.clone()).collect(),
            affected_stations: vec![station.to_string()],
        })
        .collect()
}

/// Flags trains delayed by more than [`EXCESSIVE_DELAY_MINUTES`].
#[must_use]
pub fn excessive_delay(trains: &[Train]) -> Vec<AlertDraft> {
    trains
        .iter()
        .filter(|t| t.delay > EXCESSIVE_DELAY_MINUTES)
        .map(|t| AlertDraft {
            alert_type: AlertType::Signal,
            severity: AlertSeverity::Medium,
            title: "Excessive Delay".to_string(),
            description: format!("Train {} delayed by {} minutes", t.number, t.delay),
            affected_trains: vec![t.id.clone()],
            affected_stations: vec![t.current_station.clone()],
        })
        .collect()
}
