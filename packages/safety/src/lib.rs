#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rule-based safety monitor.
//!
//! The monitor owns the alert list. A check pass prunes stale resolved
//! alerts, evaluates the rules in [`checks`], and appends each candidate
//! unless an unresolved alert with the same type and title was already open
//! when the pass started, so repeated passes do not pile up identical
//! alerts. All read operations
//! hide resolved alerts.

pub mod checks;

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};
use railway_ops_models::{AlertSeverity, AlertType, SafetyAlert, Train, WeatherSnapshot};
use serde::{Deserialize, Serialize};

/// How long a resolved alert is kept before a check pass prunes it.
pub const RESOLVED_RETENTION: TimeDelta = TimeDelta::hours(1);

/// The content of an alert before the monitor assigns an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDraft {
    /// Alert category.
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Alert severity.
    pub severity: AlertSeverity,
    /// Short title.
    pub title: String,
    /// Details.
    #[serde(default)]
    pub description: String,
    /// Ids of the trains involved.
    #[serde(default)]
    pub affected_trains: Vec<String>,
    /// Codes of the stations involved.
    #[serde(default)]
    pub affected_stations: Vec<String>,
}

impl AlertDraft {
    fn into_alert(self, id: String, now: DateTime<Utc>) -> SafetyAlert {
        SafetyAlert {
            id,
            alert_type: self.alert_type,
            severity: self.severity,
            title: self.title,
            description: self.description,
            affected_trains: self.affected_trains,
            affected_stations: self.affected_stations,
            timestamp: now,
            resolved: false,
        }
    }
}

fn new_alert_id(now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("ALERT-{}-{}", now.timestamp_millis(), &suffix[..9])
}

fn initial_alerts(now: DateTime<Utc>) -> Vec<SafetyAlert> {
    vec![
        AlertDraft {
            alert_type: AlertType::Maintenance,
            severity: AlertSeverity::Medium,
            title: "Platform 3 Maintenance".to_string(),
            description: "Scheduled maintenance work on Platform 3 at Chennai Central".to_string(),
            affected_trains: vec!["EMU-001".to_string(), "EMU-002".to_string()],
            affected_stations: vec!["MAS".to_string()],
        }
        .into_alert("ALERT-001".to_string(), now),
        AlertDraft {
            alert_type: AlertType::Weather,
            severity: AlertSeverity::Low,
            title: "Weather Advisory".to_string(),
            description: "Light rain expected in the evening. Monitor track conditions."
                .to_string(),
            affected_trains: Vec::new(),
            affected_stations: vec!["MAS".to_string(), "PER".to_string(), "VLK".to_string()],
        }
        .into_alert("ALERT-002".to_string(), now),
    ]
}

/// Owner of the alert list.
#[derive(Debug, Clone, Default)]
pub struct SafetyMonitor {
    alerts: Vec<SafetyAlert>,
}

impl SafetyMonitor {
    /// Creates a monitor seeded with the standing maintenance and weather
    /// advisories (`ALERT-001`, `ALERT-002`).
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            alerts: initial_alerts(now),
        }
    }

    /// Creates a monitor with no alerts.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Unresolved alerts.
    #[must_use]
    pub fn all(&self) -> Vec<SafetyAlert> {
        self.active().cloned().collect()
    }

    /// Number of unresolved alerts.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Looks up an unresolved alert by id.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<SafetyAlert> {
        self.active().find(|a| a.id == id).cloned()
    }

    /// Unresolved alerts of the given type.
    #[must_use]
    pub fn by_type(&self, alert_type: AlertType) -> Vec<SafetyAlert> {
        self.active()
            .filter(|a| a.alert_type == alert_type)
            .cloned()
            .collect()
    }

    /// Unresolved alerts of the given severity.
    #[must_use]
    pub fn by_severity(&self, severity: AlertSeverity) -> Vec<SafetyAlert> {
        self.active()
            .filter(|a| a.severity == severity)
            .cloned()
            .collect()
    }

    fn active(&self) -> impl Iterator<Item = &SafetyAlert> {
        self.alerts.iter().filter(|a| !a.resolved)
    }

    /// Stores a new alert, assigning it an id and timestamp.
    pub fn create_alert(&mut self, draft: AlertDraft, now: DateTime<Utc>) -> SafetyAlert {
        let alert = draft.into_alert(new_alert_id(now), now);
        log::info!(
            "Raised {} {} alert {}: {}",
            alert.severity,
            alert.alert_type,
            alert.id,
            alert.title
        );
        self.alerts.push(alert.clone());
        alert
    }

    /// Marks an alert resolved. Returns `false` if the id is unknown or
    /// already resolved.
    pub fn resolve_alert(&mut self, id: &str) -> bool {
        let Some(alert) = self
            .alerts
            .iter_mut()
            .find(|a| !a.resolved && a.id == id)
        else {
            return false;
        };
        alert.resolved = true;
        log::info!("Resolved alert {id}");
        true
    }

    /// Drops resolved alerts older than [`RESOLVED_RETENTION`].
    fn prune(&mut self, now: DateTime<Utc>) {
        let before = self.alerts.len();
        self.alerts
            .retain(|a| !a.resolved || now - a.timestamp < RESOLVED_RETENTION);
        let pruned = before - self.alerts.len();
        if pruned > 0 {
            log::debug!("Pruned {pruned} resolved alerts");
        }
    }

    /// Runs one monitoring pass and returns the unresolved alerts.
    ///
    /// Rules run in order: weather compliance, speed-limit compliance
    /// against the weather restriction, platform double-booking, excessive
    /// delay. A candidate is dropped when an unresolved alert with the same
    /// type and title existed before the pass; every candidate of the pass
    /// itself is kept.
    pub fn run_safety_check(
        &mut self,
        trains: &[Train],
        weather: &WeatherSnapshot,
        now: DateTime<Utc>,
    ) -> Vec<SafetyAlert> {
        self.prune(now);

        let candidates = checks::weather_compliance(weather, trains)
            .into_iter()
            .chain(checks::speed_compliance(
                trains,
                weather.impact.speed_restriction(),
            ))
            .chain(checks::platform_occupancy(trains))
            .chain(checks::excessive_delay(trains));

        let open: HashSet<(AlertType, String)> = self
            .active()
            .map(|a| (a.alert_type, a.title.clone()))
            .collect();

        let mut raised = 0_usize;
        for draft in candidates {
            if !open.contains(&(draft.alert_type, draft.title.clone())) {
                self.create_alert(draft, now);
                raised += 1;
            }
        }

        log::debug!(
            "Safety check raised {raised} alerts, {} active",
            self.active_count()
        );

        self.all()
    }
}
