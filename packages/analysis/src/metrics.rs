//! Dashboard metrics.

use std::collections::BTreeMap;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use railway_ops_models::{
    AiBreakdown, Conflict, HistoricalPoint, Recommendation, SystemMetrics, Train, TrainStatus,
    TrainType, WeatherBreakdown, WeatherSnapshot,
};
use rand::Rng;

/// Trains delayed by at most this many minutes count as on time.
pub const ON_TIME_TOLERANCE_MINUTES: u32 = 5;

/// Conflicts at or above this priority are counted as critical.
pub const CRITICAL_CONFLICT_PRIORITY: u8 = 8;

/// Share of the fleet expected to hold a platform at any moment.
const PLATFORM_CAPACITY_RATIO: f64 = 0.6;

/// Longest historical series served, in hours.
pub const MAX_HISTORY_HOURS: u32 = 168;

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, whole: f64) -> u32 {
    if whole <= 0.0 {
        return 0;
    }
    round_u32(part as f64 / whole * 100.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_u32(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

/// Estimated passengers on board, from load and seat capacity of counted
/// service classes.
#[must_use]
pub fn estimated_passengers(trains: &[Train]) -> u64 {
    trains
        .iter()
        .filter_map(|t| {
            t.train_type
                .passenger_capacity()
                .map(|capacity| u64::from(t.passenger_load) * u64::from(capacity) / 100)
        })
        .sum()
}

/// Aggregates the current state into dashboard metrics.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_metrics(
    trains: &[Train],
    active_alerts: usize,
    weather: &WeatherSnapshot,
    recommendations: &[Recommendation],
    conflicts: &[Conflict],
) -> SystemMetrics {
    let total = trains.len();

    let on_time = trains
        .iter()
        .filter(|t| t.delay <= ON_TIME_TOLERANCE_MINUTES)
        .count();
    let total_delay: u64 = trains.iter().map(|t| u64::from(t.delay)).sum();
    let average_delay = if total == 0 {
        0
    } else {
        round_u32(total_delay as f64 / total as f64)
    };
    let holding_platform = trains
        .iter()
        .filter(|t| t.platform.is_some() && t.status != TrainStatus::Departed)
        .count();

    let mut train_types: BTreeMap<String, usize> = TrainType::all()
        .iter()
        .map(|t| (t.to_string(), 0))
        .collect();
    for train in trains {
        *train_types.entry(train.train_type.to_string()).or_default() += 1;
    }

    SystemMetrics {
        active_trains: trains
            .iter()
            .filter(|t| t.status != TrainStatus::Cancelled)
            .count(),
        on_time_performance: percent(on_time, total as f64),
        active_alerts,
        passengers_today: estimated_passengers(trains),
        average_delay,
        platform_utilization: percent(holding_platform, total as f64 * PLATFORM_CAPACITY_RATIO),
        weather: WeatherBreakdown {
            condition: weather.condition,
            impact: weather.impact,
            speed_restriction: weather.impact.speed_restriction(),
        },
        ai: AiBreakdown {
            recommendations: recommendations.len(),
            conflicts: conflicts.len(),
            critical_conflicts: conflicts
                .iter()
                .filter(|c| c.priority >= CRITICAL_CONFLICT_PRIORITY)
                .count(),
        },
        train_types,
    }
}

/// Synthesizes an hourly series covering the last `hours` hours (clamped to
/// `1..=168`), oldest first. Nothing is stored; values are drawn from `rng`.
#[must_use]
pub fn historical_series<R: Rng>(hours: u32, now: DateTime<Utc>, rng: &mut R) -> Vec<HistoricalPoint> {
    let hours = hours.clamp(1, MAX_HISTORY_HOURS);
    let current_hour = now.duration_trunc(TimeDelta::hours(1)).unwrap_or(now);

    (0..hours)
        .rev()
        .map(|ago| HistoricalPoint {
            timestamp: current_hour - TimeDelta::hours(i64::from(ago)),
            on_time_performance: rng.gen_range(70..=98),
            average_delay: rng.gen_range(0..=15),
            active_trains: rng.gen_range(18..=26),
            passengers: rng.gen_range(15_000..=30_000),
            alerts: rng.gen_range(0..=6),
        })
        .collect()
}
