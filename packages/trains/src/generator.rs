//! Seedable mock fleet generator.
//!
//! Each service class is described by a [`FleetSpec`] row. The generator
//! walks the table with a `ChaCha8Rng`, so the same seed, station list and
//! clock always produce the same fleet.

use std::ops::RangeInclusive;

use chrono::{NaiveTime, TimeDelta};
use railway_ops_models::{Coordinates, Station, Train, TrainStatus, TrainType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Statuses a freshly generated train can start in.
const INITIAL_STATUSES: &[TrainStatus] = &[
    TrainStatus::OnTime,
    TrainStatus::Delayed,
    TrainStatus::Departed,
];

/// Maximum coordinate jitter, in degrees, around the current station.
const POSITION_JITTER: f64 = 0.01;

/// Which prefix of the corridor a train's route covers.
#[derive(Debug, Clone)]
enum RouteSpan {
    /// Every station.
    Full,
    /// The first `n` stations, `n` drawn from the range.
    Prefix(RangeInclusive<usize>),
}

/// Generation parameters for one service class.
#[derive(Debug, Clone)]
struct FleetSpec {
    train_type: TrainType,
    count: usize,
    id_prefix: &'static str,
    number_prefix: &'static str,
    name_prefix: &'static str,
    pad_number: bool,
    priority: RangeInclusive<u8>,
    speed: RangeInclusive<u32>,
    delay: RangeInclusive<u32>,
    load: RangeInclusive<u32>,
    max_platform: Option<u32>,
    route: RouteSpan,
    arrival_offset: RangeInclusive<i64>,
    departure_offset: RangeInclusive<i64>,
}

fn fleet() -> Vec<FleetSpec> {
    vec![
        FleetSpec {
            train_type: TrainType::Emu,
            count: 15,
            id_prefix: "EMU",
            number_prefix: "43",
            name_prefix: "EMU Local",
            pad_number: true,
            priority: 3..=5,
            speed: 20..=79,
            delay: 0..=14,
            load: 60..=99,
            max_platform: Some(4),
            route: RouteSpan::Prefix(8..=12),
            arrival_offset: 0..=29,
            departure_offset: 2..=34,
        },
        FleetSpec {
            train_type: TrainType::Express,
            count: 6,
            id_prefix: "EXP",
            number_prefix: "166",
            name_prefix: "Chennai Express",
            pad_number: false,
            priority: 6..=8,
            speed: 80..=119,
            delay: 0..=19,
            load: 70..=99,
            max_platform: Some(6),
            route: RouteSpan::Full,
            arrival_offset: 0..=59,
            departure_offset: 5..=64,
        },
        FleetSpec {
            train_type: TrainType::Superfast,
            count: 2,
            id_prefix: "SF",
            number_prefix: "126",
            name_prefix: "Coromandel Superfast",
            pad_number: false,
            priority: 8..=9,
            speed: 100..=139,
            delay: 0..=9,
            load: 75..=99,
            max_platform: Some(6),
            route: RouteSpan::Full,
            arrival_offset: 0..=59,
            departure_offset: 5..=64,
        },
        FleetSpec {
            train_type: TrainType::Freight,
            count: 3,
            id_prefix: "FRT",
            number_prefix: "560",
            name_prefix: "Freight",
            pad_number: false,
            priority: 1..=2,
            speed: 40..=69,
            delay: 0..=29,
            load: 0..=0,
            max_platform: None,
            route: RouteSpan::Prefix(6..=13),
            arrival_offset: 0..=119,
            departure_offset: 10..=129,
        },
    ]
}

/// Formats `now + offset_minutes` as a 24h `HH:MM` string, wrapping past
/// midnight.
#[must_use]
pub fn clock_string(now: NaiveTime, offset_minutes: i64) -> String {
    (now + TimeDelta::minutes(offset_minutes))
        .format("%H:%M")
        .to_string()
}

/// Generates the mock fleet for the given corridor.
///
/// Returns an empty fleet when `stations` is empty.
#[must_use]
pub fn generate_fleet(seed: u64, stations: &[Station], now: NaiveTime) -> Vec<Train> {
    if stations.is_empty() {
        log::warn!("No stations configured, generating an empty fleet");
        return Vec::new();
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut trains = Vec::new();

    for spec in fleet() {
        for i in 1..=spec.count {
            trains.push(generate_train(&mut rng, &spec, i, stations, now));
        }
    }

    log::debug!("Generated {} trains from seed {seed}", trains.len());

    trains
}

fn generate_train(
    rng: &mut ChaCha8Rng,
    spec: &FleetSpec,
    index: usize,
    stations: &[Station],
    now: NaiveTime,
) -> Train {
    let last = stations.len() - 1;
    let current_idx = rng.gen_range(0..stations.len());
    let next_idx = (current_idx + 1).min(last);
    let current = &stations[current_idx];

    let route_len = match &spec.route {
        RouteSpan::Full => stations.len(),
        RouteSpan::Prefix(range) => rng.gen_range(range.clone()).min(stations.len()),
    };
    let route = stations[..route_len].iter().map(|s| s.code.clone()).collect();

    let number = if spec.pad_number {
        format!("{}{index:03}", spec.number_prefix)
    } else {
        format!("{}{index}", spec.number_prefix)
    };

    let platform = spec
        .max_platform
        .map(|max| rng.gen_range(1..=max).to_string());

    Train {
        id: format!("{}-{index:03}", spec.id_prefix),
        number,
        name: format!("{} {index}", spec.name_prefix),
        train_type: spec.train_type,
        status: INITIAL_STATUSES[rng.gen_range(0..INITIAL_STATUSES.len())],
        current_station: current.code.clone(),
        next_station: stations[next_idx].code.clone(),
        speed: rng.gen_range(spec.speed.clone()),
        delay: rng.gen_range(spec.delay.clone()),
        passenger_load: rng.gen_range(spec.load.clone()),
        platform,
        estimated_arrival: clock_string(now, rng.gen_range(spec.arrival_offset.clone())),
        estimated_departure: clock_string(now, rng.gen_range(spec.departure_offset.clone())),
        route,
        priority: rng.gen_range(spec.priority.clone()),
        coordinates: Coordinates {
            lat: current.coordinates.lat + rng.gen_range(-0.5..0.5) * POSITION_JITTER,
            lng: current.coordinates.lng + rng.gen_range(-0.5..0.5) * POSITION_JITTER,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railway_ops_stations::all_stations;

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn same_seed_same_fleet() {
        let a = generate_fleet(7, all_stations(), noon());
        let b = generate_fleet(7, all_stations(), noon());
        assert_eq!(a, b);
    }

    #[test]
    fn fleet_counts_per_type() {
        let fleet = generate_fleet(1, all_stations(), noon());
        let count = |t: TrainType| fleet.iter().filter(|tr| tr.train_type == t).count();
        assert_eq!(count(TrainType::Emu), 15);
        assert_eq!(count(TrainType::Express), 6);
        assert_eq!(count(TrainType::Superfast), 2);
        assert_eq!(count(TrainType::Freight), 3);
    }

    #[test]
    fn fields_within_ranges() {
        for seed in 0..20 {
            for train in generate_fleet(seed, all_stations(), noon()) {
                assert!((1..=10).contains(&train.priority), "{}", train.id);
                assert!(train.passenger_load <= 100, "{}", train.id);
                assert!(!train.route.is_empty(), "{}", train.id);
                assert_eq!(train.estimated_arrival.len(), 5, "{}", train.id);
                match train.train_type {
                    TrainType::Freight => {
                        assert!(train.platform.is_none());
                        assert_eq!(train.passenger_load, 0);
                        assert!(train.priority <= 2);
                    }
                    TrainType::Emu => {
                        let platform: u32 = train.platform.as_deref().unwrap().parse().unwrap();
                        assert!((1..=4).contains(&platform));
                        assert!((8..=12).contains(&train.route.len()));
                    }
                    TrainType::Express | TrainType::Superfast => {
                        assert_eq!(train.route.len(), all_stations().len());
                    }
                }
            }
        }
    }

    #[test]
    fn ids_are_unique() {
        let fleet = generate_fleet(3, all_stations(), noon());
        let mut ids: Vec<&str> = fleet.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), fleet.len());
    }

    #[test]
    fn clock_string_wraps_midnight() {
        let late = NaiveTime::from_hms_opt(23, 50, 0).unwrap();
        assert_eq!(clock_string(late, 15), "00:05");
        assert_eq!(clock_string(noon(), 0), "12:00");
    }

    #[test]
    fn empty_corridor_yields_empty_fleet() {
        assert!(generate_fleet(1, &[], noon()).is_empty());
    }
}
