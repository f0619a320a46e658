#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Conflict detection, recommendations, what-if analysis and metrics.
//!
//! The detectors and rules are pure functions over a slice of trains and a
//! weather snapshot. [`AnalysisEngine`] only remembers the output of the
//! most recent pass so the dashboard can look items up by id; every pass
//! replaces both lists, carrying over the ids of conflicts that persist.

pub mod conflicts;
pub mod metrics;
pub mod recommendations;
pub mod what_if;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use railway_ops_models::{
    Conflict, ConflictType, Recommendation, RecommendationType, Train, WeatherSnapshot,
};
use serde::Serialize;

pub use what_if::{WhatIfResult, WhatIfScenario, run_what_if};

/// Either kind of analysis output, as returned by an id lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnalysisItem {
    /// A recommendation from the last pass.
    Recommendation(Recommendation),
    /// A conflict from the last pass.
    Conflict(Conflict),
}

/// Holds the most recent analysis pass.
#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    recommendations: Vec<Recommendation>,
    conflicts: Vec<Conflict>,
    last_run: Option<DateTime<Utc>>,
}

impl AnalysisEngine {
    /// Creates an engine with no results yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes both recommendations and conflicts.
    pub fn refresh(
        &mut self,
        trains: &[Train],
        weather: &WeatherSnapshot,
        local_hour: u32,
        now: DateTime<Utc>,
    ) {
        self.refresh_recommendations(trains, weather, local_hour, now);
        self.refresh_conflicts(trains, now);
        log::debug!(
            "Analysis pass: {} recommendations, {} conflicts",
            self.recommendations.len(),
            self.conflicts.len()
        );
    }

    /// Recomputes the conflict list and returns it.
    ///
    /// A conflict that was already known (same type, station and trains)
    /// keeps its id, so ids handed out earlier stay valid across passes.
    pub fn refresh_conflicts(&mut self, trains: &[Train], now: DateTime<Utc>) -> Vec<Conflict> {
        let mut known: BTreeMap<_, String> = self
            .conflicts
            .drain(..)
            .map(|c| (c.signature(), c.id))
            .collect();

        self.conflicts = conflicts::detect_conflicts(trains, now)
            .into_iter()
            .map(|mut conflict| {
                if let Some(id) = known.remove(&conflict.signature()) {
                    conflict.id = id;
                }
                conflict
            })
            .collect();
        self.last_run = Some(now);
        self.conflicts.clone()
    }

    /// Recomputes the recommendation list and returns it.
    pub fn refresh_recommendations(
        &mut self,
        trains: &[Train],
        weather: &WeatherSnapshot,
        local_hour: u32,
        now: DateTime<Utc>,
    ) -> Vec<Recommendation> {
        self.recommendations =
            recommendations::generate_recommendations(trains, weather, local_hour, now);
        self.last_run = Some(now);
        self.recommendations.clone()
    }

    /// Recommendations from the last pass.
    #[must_use]
    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    /// Recommendations of one type from the last pass.
    #[must_use]
    pub fn recommendations_by_type(&self, kind: RecommendationType) -> Vec<Recommendation> {
        self.recommendations
            .iter()
            .filter(|r| r.recommendation_type == kind)
            .cloned()
            .collect()
    }

    /// Conflicts from the last pass.
    #[must_use]
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Conflicts of one type from the last pass.
    #[must_use]
    pub fn conflicts_by_type(&self, kind: ConflictType) -> Vec<Conflict> {
        self.conflicts
            .iter()
            .filter(|c| c.conflict_type == kind)
            .cloned()
            .collect()
    }

    /// Looks an id up across recommendations, then conflicts.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<AnalysisItem> {
        self.recommendations
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .map(AnalysisItem::Recommendation)
            .or_else(|| {
                self.conflicts
                    .iter()
                    .find(|c| c.id == id)
                    .cloned()
                    .map(AnalysisItem::Conflict)
            })
    }

    /// When the last pass ran.
    #[must_use]
    pub const fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }
}
