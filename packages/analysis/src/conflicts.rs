//! Conflict detection.
//!
//! Trains are grouped by a shared key and every group with more than one
//! member becomes a [`Conflict`]:
//!
//! * platform: `(current station, platform)` among trains that have a
//!   platform and have not departed;
//! * timing: `(current station, estimated arrival)`;
//! * track: `(current station, next station)`, flagged only when the first
//!   two trains of the group arrive less than [`TRACK_HEADWAY`] apart.
//!
//! Groups are emitted in key order, and members keep registry order.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use railway_ops_models::{Conflict, ConflictType, MAX_PRIORITY, Train, TrainStatus};

/// Minimum separation between two trains entering the same segment.
pub const TRACK_HEADWAY: TimeDelta = TimeDelta::minutes(5);

fn conflict_id(kind: &str, now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("CONF-{kind}-{}-{}", now.timestamp_millis(), &suffix[..9])
}

/// Urgency of a conflict: the highest participant priority plus one point
/// per 100% of combined passenger load, capped at 10.
#[must_use]
pub fn conflict_priority(trains: &[&Train]) -> u8 {
    let max_priority = trains.iter().map(|t| u32::from(t.priority)).max().unwrap_or(0);
    let load: u32 = trains.iter().map(|t| t.passenger_load).sum();
    let score = (max_priority + load / 100).min(u32::from(MAX_PRIORITY));
    u8::try_from(score).unwrap_or(MAX_PRIORITY)
}

/// Participants ordered by descending priority; ties keep registry order.
fn by_priority<'a>(trains: &[&'a Train]) -> Vec<&'a Train> {
    let mut sorted = trains.to_vec();
    sorted.sort_by_key(|t| Reverse(t.priority));
    sorted
}

fn ids(trains: &[&Train]) -> Vec<String> {
    trains.iter().map(|t| t.id.clone()).collect()
}

fn group_by<'a, K: Ord>(
    trains: impl Iterator<Item = &'a Train>,
    key: impl Fn(&'a Train) -> K,
) -> BTreeMap<K, Vec<&'a Train>> {
    let mut groups: BTreeMap<K, Vec<&'a Train>> = BTreeMap::new();
    for train in trains {
        groups.entry(key(train)).or_default().push(train);
    }
    groups
}

/// Parses an `HH:MM` clock string.
fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Whether two `HH:MM` arrivals are closer than [`TRACK_HEADWAY`],
/// comparing time of day only. Unparseable times never conflict.
#[must_use]
pub fn arrivals_within_headway(a: &str, b: &str) -> bool {
    match (parse_clock(a), parse_clock(b)) {
        (Some(a), Some(b)) => (a - b).abs() < TRACK_HEADWAY,
        _ => false,
    }
}

/// Trains sharing a platform at the same station.
#[must_use]
pub fn platform_conflicts(trains: &[Train], now: DateTime<Utc>) -> Vec<Conflict> {
    let occupying = trains.iter().filter(|t| {
        t.platform.as_deref().is_some_and(|p| !p.is_empty()) && t.status != TrainStatus::Departed
    });
    let groups = group_by(occupying, |t| {
        (
            t.current_station.as_str(),
            t.platform.as_deref().unwrap_or_default(),
        )
    });

    groups
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|((station, platform), group)| {
            let favoured = by_priority(&group)[0];
            Conflict {
                id: conflict_id("PLATFORM", now),
                conflict_type: ConflictType::Platform,
                trains: ids(&group),
                station: station.to_string(),
                description: format!("Multiple trains assigned to {station} Platform {platform}"),
                suggested_resolution: format!(
                    "Assign Platform to {} (Priority: {}). Redirect other trains to available platforms.",
                    favoured.number, favoured.priority
                ),
                priority: conflict_priority(&group),
                timestamp: now,
            }
        })
        .collect()
}

/// Trains due at the same station at the same minute.
#[must_use]
pub fn timing_conflicts(trains: &[Train], now: DateTime<Utc>) -> Vec<Conflict> {
    let scheduled = trains.iter().filter(|t| !t.estimated_arrival.is_empty());
    let groups = group_by(scheduled, |t| {
        (t.current_station.as_str(), t.estimated_arrival.as_str())
    });

    groups
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|((station, arrival), group)| {
            let favoured = by_priority(&group)[0];
            Conflict {
                id: conflict_id("TIMING", now),
                conflict_type: ConflictType::Timing,
                trains: ids(&group),
                station: station.to_string(),
                description: format!("Multiple trains scheduled to arrive at {arrival}"),
                suggested_resolution: format!(
                    "Maintain schedule for {} (highest priority). Delay others by 2-3 minutes.",
                    favoured.number
                ),
                priority: conflict_priority(&group),
                timestamp: now,
            }
        })
        .collect()
}

/// Trains entering the same segment within the headway.
#[must_use]
pub fn track_conflicts(trains: &[Train], now: DateTime<Utc>) -> Vec<Conflict> {
    let groups = group_by(trains.iter(), |t| {
        (t.current_station.as_str(), t.next_station.as_str())
    });

    groups
        .into_iter()
        .filter(|(_, group)| {
            group.len() > 1
                && arrivals_within_headway(&group[0].estimated_arrival, &group[1].estimated_arrival)
        })
        .map(|((from, to), group)| {
            let ranked = by_priority(&group);
            Conflict {
                id: conflict_id("TRACK", now),
                conflict_type: ConflictType::Track,
                trains: ids(&group),
                station: from.to_string(),
                description: format!("Multiple trains on same track segment: {from}-{to}"),
                suggested_resolution: format!(
                    "Give track priority to {}. Hold {} at current station for 5 minutes.",
                    ranked[0].number, ranked[1].number
                ),
                priority: conflict_priority(&group),
                timestamp: now,
            }
        })
        .collect()
}

/// Runs every detector: platform, then timing, then track.
#[must_use]
pub fn detect_conflicts(trains: &[Train], now: DateTime<Utc>) -> Vec<Conflict> {
    let mut conflicts = platform_conflicts(trains, now);
    conflicts.extend(timing_conflicts(trains, now));
    conflicts.extend(track_conflicts(trains, now));
    conflicts
}
