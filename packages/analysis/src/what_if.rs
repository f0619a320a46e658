//! What-if analysis.
//!
//! A scenario is evaluated against a private copy of the fleet: overrides
//! are applied to the copy, conflicts are detected on both the baseline and
//! the modified fleet, and only conflicts absent from the baseline are
//! reported. The caller's trains are never modified.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use railway_ops_models::{
    Conflict, ConflictType, Recommendation, RecommendationType, Train, clamp_priority,
};
use serde::{Deserialize, Serialize};

use crate::conflicts::detect_conflicts;

/// A hypothetical change to one train.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfScenario {
    /// Train to change.
    pub train_id: String,
    /// Replacement priority (clamped into `1..=10`).
    #[serde(default)]
    pub new_priority: Option<i64>,
    /// Replacement route.
    #[serde(default)]
    pub new_route: Option<Vec<String>>,
    /// Minutes added to the current delay. Negative values shorten it, but
    /// never below zero.
    #[serde(default)]
    pub delay_minutes: Option<i64>,
}

/// Outcome of a what-if analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfResult {
    /// Summary of the changes and their passenger impact.
    pub impact: String,
    /// Ids of other trains sharing stations with the changed train.
    pub affected_trains: Vec<String>,
    /// Conflicts introduced by the scenario.
    pub new_conflicts: Vec<Conflict>,
    /// Advice derived from the scenario.
    pub recommendations: Vec<Recommendation>,
}

impl WhatIfResult {
    fn not_found() -> Self {
        Self {
            impact: "Train not found".to_string(),
            affected_trains: Vec::new(),
            new_conflicts: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

fn apply_delay(delay: u32, extra: i64) -> u32 {
    let total = i64::from(delay).saturating_add(extra).max(0);
    u32::try_from(total).unwrap_or(u32::MAX)
}

/// Applies the scenario's overrides to a copy of `original`.
///
/// A new route also re-derives the next station when the current station
/// is on it.
#[must_use]
pub fn apply_scenario(original: &Train, scenario: &WhatIfScenario) -> Train {
    let mut train = original.clone();

    if let Some(priority) = scenario.new_priority {
        train.priority = clamp_priority(priority);
    }
    if let Some(extra) = scenario.delay_minutes {
        train.delay = apply_delay(train.delay, extra);
    }
    if let Some(route) = &scenario.new_route {
        train.route.clone_from(route);
        if let Some(idx) = route.iter().position(|c| *c == train.current_station)
            && let Some(next) = route.get(idx + 1).or_else(|| route.last())
        {
            train.next_station.clone_from(next);
        }
    }

    train
}

/// Other trains at the changed train's current station, heading to it, or
/// sharing any station on its route.
#[must_use]
pub fn find_affected_trains<'a>(trains: &'a [Train], changed: &Train) -> Vec<&'a Train> {
    trains
        .iter()
        .filter(|t| {
            t.id != changed.id
                && (t.current_station == changed.current_station
                    || t.next_station == changed.current_station
                    || t.route.iter().any(|code| changed.route.contains(code)))
        })
        .collect()
}

fn scenario_impact(scenario: &WhatIfScenario, original: &Train, modified: &Train) -> String {
    let mut lines = vec![format!("Changes to {}:", original.number)];

    if scenario.new_priority.is_some() {
        lines.push(format!(
            "- Priority change: {} → {}",
            original.priority, modified.priority
        ));
    }
    if let Some(extra) = scenario.delay_minutes
        && extra != 0
    {
        lines.push(format!("- Additional delay: {extra:+} minutes"));
    }
    if let Some(route) = &scenario.new_route {
        lines.push(format!("- Route change: {} stations", route.len()));
    }
    lines.push(format!(
        "- Estimated passenger impact: {}% capacity affected",
        original.passenger_load
    ));

    lines.join("\n")
}

fn scenario_recommendations(
    scenario: &WhatIfScenario,
    original: &Train,
    modified: &Train,
    affected: &[&Train],
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if scenario.new_priority.is_some() && modified.priority > original.priority {
        recommendations.push(Recommendation {
            id: format!("WHATIF-{}", now.timestamp_millis()),
            recommendation_type: RecommendationType::Priority,
            title: "Priority Increase Impact".to_string(),
            description: format!(
                "Increasing priority to {} will improve scheduling",
                modified.priority
            ),
            impact: format!("Reduce delays for {} by 2-4 minutes", original.number),
            confidence: 82,
            affected_trains: vec![original.id.clone()],
            timestamp: now,
        });
    }

    if let Some(extra) = scenario.delay_minutes
        && extra > 0
    {
        recommendations.push(Recommendation {
            id: format!("WHATIF-DELAY-{}", now.timestamp_millis()),
            recommendation_type: RecommendationType::Delay,
            title: "Delay Impact Analysis".to_string(),
            description: format!(
                "Adding {extra} minutes delay will affect downstream services"
            ),
            impact: format!(
                "{} trains may experience cascading delays",
                affected.len()
            ),
            confidence: 75,
            affected_trains: affected.iter().map(|t| t.id.clone()).collect(),
            timestamp: now,
        });
    }

    recommendations
}

/// Evaluates a scenario against `trains` without modifying them.
#[must_use]
pub fn run_what_if(trains: &[Train], scenario: &WhatIfScenario, now: DateTime<Utc>) -> WhatIfResult {
    let Some(original) = trains.iter().find(|t| t.id == scenario.train_id) else {
        log::debug!("What-if requested for unknown train {}", scenario.train_id);
        return WhatIfResult::not_found();
    };

    let modified = apply_scenario(original, scenario);
    let modified_fleet: Vec<Train> = trains
        .iter()
        .map(|t| {
            if t.id == modified.id {
                modified.clone()
            } else {
                t.clone()
            }
        })
        .collect();

    let affected = find_affected_trains(&modified_fleet, &modified);

    let baseline: BTreeSet<(ConflictType, String, Vec<String>)> = detect_conflicts(trains, now)
        .iter()
        .map(Conflict::signature)
        .collect();
    let new_conflicts: Vec<Conflict> = detect_conflicts(&modified_fleet, now)
        .into_iter()
        .filter(|c| !baseline.contains(&c.signature()))
        .collect();

    let recommendations = scenario_recommendations(scenario, original, &modified, &affected, now);

    WhatIfResult {
        impact: scenario_impact(scenario, original, &modified),
        affected_trains: affected.iter().map(|t| t.id.clone()).collect(),
        new_conflicts,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::train;

    fn fleet() -> Vec<Train> {
        let mut a = train("EMU-001", "MAS", "PER");
        a.route = vec!["MAS".into(), "PER".into(), "VLK".into()];
        a.estimated_arrival = "10:00".to_string();
        let mut b = train("EMU-002", "PER", "VLK");
        b.route = vec!["PER".into(), "VLK".into()];
        b.platform = Some("2".to_string());
        b.estimated_arrival = "10:30".to_string();
        let mut c = train("FRT-001", "KOK", "WST");
        c.route = vec!["KOK".into(), "WST".into()];
        c.platform = None;
        c.estimated_arrival = "11:00".to_string();
        vec![a, b, c]
    }

    #[test]
    fn unknown_train() {
        let scenario = WhatIfScenario {
            train_id: "NOPE".to_string(),
            ..Default::default()
        };
        let result = run_what_if(&fleet(), &scenario, Utc::now());
        assert_eq!(result.impact, "Train not found");
        assert!(result.affected_trains.is_empty());
        assert!(result.new_conflicts.is_empty());
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn result_serializes_camel_case() {
        let scenario = WhatIfScenario {
            train_id: "EMU-001".to_string(),
            new_priority: Some(9),
            ..Default::default()
        };
        let json = serde_json::to_value(run_what_if(&fleet(), &scenario, Utc::now())).unwrap();
        assert!(json["impact"].as_str().unwrap().contains("Priority change: 5 → 9"));
        assert!(json["affectedTrains"].is_array());
        assert!(json["newConflicts"].is_array());
        assert!(json["recommendations"].is_array());
        assert!(json.get("affected_trains").is_none());
    }

    #[test]
    fn live_fleet_is_never_modified_and_repeatable() {
        let trains = fleet();
        let before = trains.clone();
        let scenario = WhatIfScenario {
            train_id: "EMU-001".to_string(),
            new_priority: Some(9),
            new_route: Some(vec!["MAS".into(), "KOK".into()]),
            delay_minutes: Some(12),
        };
        let first = run_what_if(&trains, &scenario, Utc::now());
        let second = run_what_if(&trains, &scenario, Utc::now());
        assert_eq!(trains, before);
        assert_eq!(first.impact, second.impact);
        assert_eq!(
            first.impact,
            "Changes to NEMU-001:\n\
             - Priority change: 5 → 9\n\
             - Additional delay: +12 minutes\n\
             - Route change: 2 stations\n\
             - Estimated passenger impact: 60% capacity affected"
        );
    }

    #[test]
    fn affected_trains_share_stations() {
        let trains = fleet();
        let scenario = WhatIfScenario {
            train_id: "EMU-001".to_string(),
            delay_minutes: Some(5),
            ..Default::default()
        };
        let result = run_what_if(&trains, &scenario, Utc::now());
        assert_eq!(result.affected_trains, vec!["EMU-002"]);
        let delay_rec = result
            .recommendations
            .iter()
            .find(|r| r.recommendation_type == RecommendationType::Delay)
            .unwrap();
        assert_eq!(delay_rec.impact, "1 trains may experience cascading delays");
    }

    #[test]
    fn priority_recommendation_only_on_increase() {
        let trains = fleet();
        let up = WhatIfScenario {
            train_id: "EMU-001".to_string(),
            new_priority: Some(8),
            ..Default::default()
        };
        let result = run_what_if(&trains, &up, Utc::now());
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].title, "Priority Increase Impact");

        let down = WhatIfScenario {
            new_priority: Some(2),
            ..up
        };
        assert!(run_what_if(&trains, &down, Utc::now()).recommendations.is_empty());
    }

    #[test]
    fn out_of_range_priority_is_clamped() {
        let trains = fleet();
        let modified = apply_scenario(
            &trains[0],
            &WhatIfScenario {
                train_id: "EMU-001".to_string(),
                new_priority: Some(50),
                ..Default::default()
            },
        );
        assert_eq!(modified.priority, 10);
    }

    #[test]
    fn negative_delay_floors_at_zero() {
        let trains = fleet();
        let modified = apply_scenario(
            &trains[0],
            &WhatIfScenario {
                train_id: "EMU-001".to_string(),
                delay_minutes: Some(-30),
                ..Default::default()
            },
        );
        assert_eq!(modified.delay, 0);
    }

    #[test]
    fn reroute_reports_only_new_conflicts() {
        let mut trains = fleet();
        // EXP-001 and EXP-002 share KOK platform 1 before any change.
        let mut d = train("EXP-001", "KOK", "WST");
        d.estimated_arrival = "12:00".to_string();
        let mut e = train("EXP-002", "KOK", "ENR");
        e.estimated_arrival = "12:30".to_string();
        trains.push(d);
        trains.push(e);
        trains[2].estimated_arrival = "12:28".to_string();

        let baseline = detect_conflicts(&trains, Utc::now());
        assert_eq!(baseline.len(), 1);
        assert_eq!(baseline[0].conflict_type, ConflictType::Platform);

        // Re-routing FRT-001 towards ENR puts it on EXP-002's segment two
        // minutes ahead of it.
        let scenario = WhatIfScenario {
            train_id: "FRT-001".to_string(),
            new_route: Some(vec!["KOK".into(), "ENR".into()]),
            ..Default::default()
        };
        let result = run_what_if(&trains, &scenario, Utc::now());
        assert_eq!(result.new_conflicts.len(), 1);
        let conflict = &result.new_conflicts[0];
        assert_eq!(conflict.conflict_type, ConflictType::Track);
        assert_eq!(conflict.trains, vec!["FRT-001", "EXP-002"]);
        assert_eq!(conflict.description, "Multiple trains on same track segment: KOK-ENR");
    }

    #[test]
    fn route_change_rederives_next_station() {
        let trains = fleet();
        let modified = apply_scenario(
            &trains[0],
            &WhatIfScenario {
                train_id: "EMU-001".to_string(),
                new_route: Some(vec!["MAS".into(), "KOK".into()]),
                ..Default::default()
            },
        );
        assert_eq!(modified.next_station, "KOK");
        assert_eq!(trains[0].next_station, "PER");
    }
}
