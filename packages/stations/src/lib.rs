#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Compile-time registry of corridor stations.
//!
//! The station list lives in `data/stations.toml` and is baked into the
//! binary via [`include_str!`]. Stations are listed in route order, so the
//! position of a station in [`all_stations`] is also its position along the
//! corridor.

use std::sync::LazyLock;

use railway_ops_models::{Coordinates, Station};
use serde::Deserialize;
use thiserror::Error;

/// Number of configured stations. Enforced by a test.
#[cfg(test)]
const EXPECTED_STATION_COUNT: usize = 14;

/// Embedded station definitions.
const STATIONS_TOML: &str = include_str!("../data/stations.toml");

static STATIONS: LazyLock<Vec<Station>> = LazyLock::new(|| {
    parse_stations_toml(STATIONS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse stations.toml: {e}"))
});

/// Errors from parsing a station definition file.
#[derive(Debug, Error)]
pub enum StationConfigError {
    /// The file is not valid TOML or does not match the expected shape.
    #[error("Invalid station TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Two entries share a code.
    #[error("Duplicate station code: {code}")]
    DuplicateCode {
        /// The repeated code.
        code: String,
    },
}

#[derive(Deserialize)]
struct StationFile {
    stations: Vec<StationEntry>,
}

#[derive(Deserialize)]
struct StationEntry {
    code: String,
    name: String,
    platforms: u32,
    lat: f64,
    lng: f64,
    distance: f64,
}

impl From<StationEntry> for Station {
    fn from(entry: StationEntry) -> Self {
        Self {
            id: entry.code.clone(),
            code: entry.code,
            name: entry.name,
            platforms: entry.platforms,
            coordinates: Coordinates {
                lat: entry.lat,
                lng: entry.lng,
            },
            distance: entry.distance,
        }
    }
}

/// Parses a station definition file.
///
/// # Errors
///
/// Returns [`StationConfigError`] if the TOML is malformed or a station
/// code appears twice.
pub fn parse_stations_toml(content: &str) -> Result<Vec<Station>, StationConfigError> {
    let file: StationFile = toml::from_str(content)?;

    let mut stations: Vec<Station> = Vec::with_capacity(file.stations.len());
    for entry in file.stations {
        if stations.iter().any(|s| s.code == entry.code) {
            return Err(StationConfigError::DuplicateCode { code: entry.code });
        }
        stations.push(entry.into());
    }

    Ok(stations)
}

/// Returns every configured station in route order.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed. Since the file is a
/// compile-time constant, a failure indicates a development error and is
/// caught by the tests below.
#[must_use]
pub fn all_stations() -> &'static [Station] {
    STATIONS.as_slice()
}

/// Looks up a station by its code.
#[must_use]
pub fn station_by_code(code: &str) -> Option<&'static Station> {
    all_stations().iter().find(|s| s.code == code)
}

/// Resolves a route of station codes, skipping codes that are not
/// configured.
#[must_use]
pub fn stations_for_route<S: AsRef<str>>(route: &[S]) -> Vec<&'static Station> {
    route
        .iter()
        .filter_map(|code| station_by_code(code.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_stations() {
        assert_eq!(all_stations().len(), EXPECTED_STATION_COUNT);
    }

    #[test]
    fn stations_are_in_route_order() {
        let distances: Vec<f64> = all_stations().iter().map(|s| s.distance).collect();
        assert!(distances.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(all_stations()[0].code, "MAS");
        assert_eq!(all_stations()[EXPECTED_STATION_COUNT - 1].code, "GPD");
    }

    #[test]
    fn lookup_by_code() {
        let mas = station_by_code("MAS").unwrap();
        assert_eq!(mas.name, "Chennai Central");
        assert_eq!(mas.platforms, 12);
        assert_eq!(mas.id, mas.code);
        assert!(station_by_code("XYZ").is_none());
    }

    #[test]
    fn route_lookup_skips_unknown_codes() {
        let stations = stations_for_route(&["PER", "NOPE", "MAS"]);
        let codes: Vec<&str> = stations.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["PER", "MAS"]);
    }

    #[test]
    fn rejects_duplicate_codes() {
        let toml = r#"
            [[stations]]
            code = "AAA"
            name = "A"
            platforms = 1
            lat = 0.0
            lng = 0.0
            distance = 0.0

            [[stations]]
            code = "AAA"
            name = "A again"
            platforms = 1
            lat = 0.0
            lng = 0.0
            distance = 1.0
        "#;
        assert!(matches!(
            parse_stations_toml(toml),
            Err(StationConfigError::DuplicateCode { code }) if code == "AAA"
        ));
    }
}
