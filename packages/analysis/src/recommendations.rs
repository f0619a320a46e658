//! Threshold rules that produce operational recommendations.
//!
//! Every rule is evaluated independently, so any subset may fire in one
//! pass.

use chrono::{DateTime, Utc};
use railway_ops_models::{
    Recommendation, RecommendationType, Train, TrainType, WeatherImpact, WeatherSnapshot,
};

/// Trains delayed by more than this many minutes count towards platform
/// reallocation.
pub const REALLOCATION_DELAY_MINUTES: u32 = 10;

/// Platform reallocation fires when more than this many trains are delayed.
pub const REALLOCATION_TRAIN_THRESHOLD: usize = 3;

/// Upper bound on trains named in a platform reallocation.
const REALLOCATION_MAX_TRAINS: usize = 5;

/// Trains delayed by more than this many minutes may need a priority boost.
pub const PRIORITY_BOOST_DELAY_MINUTES: u32 = 15;

/// Only trains below this priority are boosted.
pub const PRIORITY_BOOST_CEILING: u8 = 5;

/// Whether the local hour falls in the morning (08-10) or evening (18-20)
/// peak.
#[must_use]
pub const fn is_peak_hour(local_hour: u32) -> bool {
    matches!(local_hour, 8..=10 | 18..=20)
}

fn rec_id(kind: &str, now: DateTime<Utc>) -> String {
    format!("REC-{kind}-{}", now.timestamp_millis())
}

fn all_ids(trains: &[Train]) -> Vec<String> {
    trains.iter().map(|t| t.id.clone()).collect()
}

/// Boost EMU services during the peak.
#[must_use]
pub fn peak_hour(trains: &[Train], local_hour: u32, now: DateTime<Utc>) -> Option<Recommendation> {
    is_peak_hour(local_hour).then(|| Recommendation {
        id: rec_id("PEAK", now),
        recommendation_type: RecommendationType::Priority,
        title: "Peak Hour Priority Adjustment".to_string(),
        description:
            "Increase EMU train priority during peak hours for better passenger service"
                .to_string(),
        impact: "Reduce passenger waiting time by 20%".to_string(),
        confidence: 88,
        affected_trains: trains
            .iter()
            .filter(|t| t.train_type == TrainType::Emu)
            .map(|t| t.id.clone())
            .collect(),
        timestamp: now,
    })
}

/// Apply the weather speed restriction whenever weather is not normal.
#[must_use]
pub fn weather_restriction(
    trains: &[Train],
    weather: &WeatherSnapshot,
    now: DateTime<Utc>,
) -> Option<Recommendation> {
    if weather.impact == WeatherImpact::Normal {
        return None;
    }

    let impact = if weather.impact == WeatherImpact::Restricted {
        "Ensure safety compliance, expect 10-15 minute delays"
    } else {
        "Monitor conditions closely"
    };

    Some(Recommendation {
        id: rec_id("WEATHER", now),
        recommendation_type: RecommendationType::Route,
        title: "Weather-Based Speed Restrictions".to_string(),
        description: format!(
            "Implement {} km/h speed limit due to {}",
            weather.impact.speed_restriction(),
            weather.condition.as_ref().to_lowercase()
        ),
        impact: impact.to_string(),
        confidence: 95,
        affected_trains: all_ids(trains),
        timestamp: now,
    })
}

/// Reassign platforms when several trains are running late.
#[must_use]
pub fn platform_reallocation(trains: &[Train], now: DateTime<Utc>) -> Option<Recommendation> {
    let delayed: Vec<&Train> = trains
        .iter()
        .filter(|t| t.delay > REALLOCATION_DELAY_MINUTES)
        .collect();

    (delayed.len() > REALLOCATION_TRAIN_THRESHOLD).then(|| Recommendation {
        id: rec_id("PLATFORM", now),
        recommendation_type: RecommendationType::Platform,
        title: "Platform Reallocation".to_string(),
        description: "Optimize platform assignments to reduce delays".to_string(),
        impact: "Reduce average delay by 5-8 minutes".to_string(),
        confidence: 82,
        affected_trains: delayed
            .iter()
            .take(REALLOCATION_MAX_TRAINS)
            .map(|t| t.id.clone())
            .collect(),
        timestamp: now,
    })
}

/// Raise the priority of badly delayed low-priority trains.
#[must_use]
pub fn priority_adjustment(trains: &[Train], now: DateTime<Utc>) -> Option<Recommendation> {
    let candidates: Vec<String> = trains
        .iter()
        .filter(|t| t.delay > PRIORITY_BOOST_DELAY_MINUTES && t.priority < PRIORITY_BOOST_CEILING)
        .map(|t| t.id.clone())
        .collect();

    (!candidates.is_empty()).then(|| Recommendation {
        id: rec_id("PRIORITY", now),
        recommendation_type: RecommendationType::Priority,
        title: "Priority Adjustment for Delayed Trains".to_string(),
        description: "Increase priority for significantly delayed trains".to_string(),
        impact: "Improve recovery time for delayed services".to_string(),
        confidence: 75,
        affected_trains: candidates,
        timestamp: now,
    })
}

/// Evaluates every rule: peak hour, weather, platform reallocation,
/// priority adjustment.
#[must_use]
pub fn generate_recommendations(
    trains: &[Train],
    weather: &WeatherSnapshot,
    local_hour: u32,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    [
        peak_hour(trains, local_hour, now),
        weather_restriction(trains, weather, now),
        platform_reallocation(trains, now),
        priority_adjustment(trains, now),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Weather advice on demand; only severe (restricted) weather produces a
/// recommendation here.
#[must_use]
pub fn weather_based_recommendations(
    trains: &[Train],
    weather: &WeatherSnapshot,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    if weather.impact != WeatherImpact::Restricted {
        return Vec::new();
    }
    weather_restriction(trains, weather, now).into_iter().collect()
}

/// Priority advice on demand; currently only the peak-hour rule.
#[must_use]
pub fn priority_optimization(
    trains: &[Train],
    local_hour: u32,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    peak_hour(trains, local_hour, now).into_iter().collect()
}
