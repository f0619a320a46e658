#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Mock weather generator.
//!
//! Holds exactly one [`WeatherSnapshot`]. A scheduler calls [`WeatherGenerator::tick`]
//! periodically; each tick replaces the snapshot with probability
//! [`CHANGE_PROBABILITY`]. Visibility and impact are derived from the
//! drawn condition by [`classify`], and the line speed restriction is a
//! pure function of impact.

use chrono::{DateTime, Utc};
use railway_ops_models::{WeatherCondition, WeatherImpact, WeatherSnapshot};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Chance that a tick replaces the current snapshot.
pub const CHANGE_PROBABILITY: f64 = 0.2;

/// Fog below this visibility (km) restricts operations.
pub const FOG_RESTRICTED_VISIBILITY_KM: f64 = 2.0;

/// Maps a condition and visibility to an operating impact.
#[must_use]
pub fn classify(condition: WeatherCondition, visibility_km: f64) -> WeatherImpact {
    match condition {
        WeatherCondition::Fog if visibility_km < FOG_RESTRICTED_VISIBILITY_KM => {
            WeatherImpact::Restricted
        }
        WeatherCondition::Fog
        | WeatherCondition::HeavyRain
        | WeatherCondition::Thunderstorm
        | WeatherCondition::LightRain => WeatherImpact::Caution,
        WeatherCondition::Clear | WeatherCondition::PartlyCloudy | WeatherCondition::Cloudy => {
            WeatherImpact::Normal
        }
    }
}

/// Human-readable operating guidance for a snapshot.
#[must_use]
pub fn impact_description(weather: &WeatherSnapshot) -> String {
    match weather.impact {
        WeatherImpact::Restricted => format!(
            "Severe weather conditions. Speed restrictions: {} km/h. Visibility: {} km.",
            weather.impact.speed_restriction(),
            weather.visibility
        ),
        WeatherImpact::Caution => format!(
            "Caution advised. Speed restrictions: {} km/h. Monitor conditions closely.",
            weather.impact.speed_restriction()
        ),
        WeatherImpact::Normal => "Normal weather conditions. No restrictions.".to_string(),
    }
}

/// Draws a visibility (km) plausible for the condition.
fn draw_visibility(rng: &mut ChaCha8Rng, condition: WeatherCondition) -> f64 {
    let raw: f64 = match condition {
        WeatherCondition::Fog => rng.gen_range(0.5..2.5),
        WeatherCondition::HeavyRain | WeatherCondition::Thunderstorm => rng.gen_range(2.0..5.0),
        WeatherCondition::LightRain => rng.gen_range(5.0..7.0),
        WeatherCondition::Clear | WeatherCondition::PartlyCloudy | WeatherCondition::Cloudy => {
            rng.gen_range(8.0..13.0)
        }
    };
    (raw * 10.0).round() / 10.0
}

fn draw_snapshot(rng: &mut ChaCha8Rng) -> WeatherSnapshot {
    let conditions = WeatherCondition::all();
    let condition = conditions[rng.gen_range(0..conditions.len())];
    let visibility = draw_visibility(rng, condition);

    WeatherSnapshot {
        temperature: rng.gen_range(20..35),
        condition,
        visibility,
        wind_speed: rng.gen_range(5..25),
        humidity: rng.gen_range(40..80),
        impact: classify(condition, visibility),
    }
}

/// Owner of the current weather snapshot.
#[derive(Debug, Clone)]
pub struct WeatherGenerator {
    rng: ChaCha8Rng,
    current: WeatherSnapshot,
    last_update: DateTime<Utc>,
}

impl WeatherGenerator {
    /// Creates a generator and draws the initial snapshot.
    #[must_use]
    pub fn new(seed: u64, now: DateTime<Utc>) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let current = draw_snapshot(&mut rng);
        log::debug!("Initial weather: {} ({})", current.condition, current.impact);
        Self {
            rng,
            current,
            last_update: now,
        }
    }

    /// Creates a generator pinned to a known snapshot. Later ticks still
    /// draw from the seeded RNG.
    #[must_use]
    pub fn with_snapshot(seed: u64, snapshot: WeatherSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            current: snapshot,
            last_update: now,
        }
    }

    /// A copy of the current snapshot.
    #[must_use]
    pub fn current(&self) -> WeatherSnapshot {
        self.current.clone()
    }

    /// When the snapshot was last replaced.
    #[must_use]
    pub const fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    /// Current line speed restriction in km/h.
    #[must_use]
    pub const fn speed_restriction(&self) -> u32 {
        self.current.impact.speed_restriction()
    }

    /// Replaces the snapshot with probability [`CHANGE_PROBABILITY`].
    ///
    /// Returns whether the snapshot changed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.rng.gen_bool(CHANGE_PROBABILITY) {
            self.refresh(now);
            true
        } else {
            false
        }
    }

    /// Unconditionally replaces the snapshot.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> WeatherSnapshot {
        self.current = draw_snapshot(&mut self.rng);
        self.last_update = now;
        log::info!(
            "Weather changed to {} (visibility {} km, impact {})",
            self.current.condition,
            self.current.visibility,
            self.current.impact
        );
        self.current()
    }
}
