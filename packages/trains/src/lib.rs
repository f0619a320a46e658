#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory train registry.
//!
//! The registry owns the fleet and is the only component that mutates
//! train records. Lookups that can miss return `None`, updates that can be
//! rejected return `false`; callers decide how to surface either.

pub mod generator;

use chrono::NaiveTime;
use railway_ops_models::{Station, Train, TrainStatus, TrainType, clamp_priority};

/// The fleet of trains currently tracked.
#[derive(Debug, Clone, Default)]
pub struct TrainRegistry {
    trains: Vec<Train>,
}

impl TrainRegistry {
    /// Builds a registry around an explicit list of trains.
    #[must_use]
    pub const fn from_trains(trains: Vec<Train>) -> Self {
        Self { trains }
    }

    /// Builds a registry populated with the seeded mock fleet.
    #[must_use]
    pub fn generate(seed: u64, stations: &[Station], now: NaiveTime) -> Self {
        Self::from_trains(generator::generate_fleet(seed, stations, now))
    }

    /// All trains, in registration order.
    #[must_use]
    pub fn all(&self) -> &[Train] {
        &self.trains
    }

    /// An owned copy of the fleet for computations that must not hold the
    /// registry.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Train> {
        self.trains.clone()
    }

    /// Looks up a train by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Train> {
        self.trains.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Train> {
        self.trains.iter_mut().find(|t| t.id == id)
    }

    /// Trains of the given service class.
    #[must_use]
    pub fn by_type(&self, train_type: TrainType) -> Vec<Train> {
        self.trains
            .iter()
            .filter(|t| t.train_type == train_type)
            .cloned()
            .collect()
    }

    /// Trains whose current stop, next stop, or route includes the station.
    #[must_use]
    pub fn by_station(&self, station_code: &str) -> Vec<Train> {
        self.trains
            .iter()
            .filter(|t| t.serves(station_code))
            .cloned()
            .collect()
    }

    /// Adds a train, replacing any existing train with the same id.
    pub fn insert(&mut self, train: Train) {
        if let Some(existing) = self.get_mut(&train.id) {
            *existing = train;
        } else {
            self.trains.push(train);
        }
    }

    /// Moves a train to a station on its route.
    ///
    /// The next station becomes the following route entry, or the final
    /// entry again when the train is at the end of its route. Returns
    /// `false` and leaves the train untouched when the train is unknown or
    /// the station is not on its route.
    pub fn update_position(&mut self, id: &str, station_code: &str) -> bool {
        let Some(train) = self.get_mut(id) else {
            return false;
        };
        let Some(idx) = train.route.iter().position(|code| code == station_code) else {
            log::warn!("Rejected move of {id}: {station_code} is not on its route");
            return false;
        };

        let next = train
            .route
            .get(idx + 1)
            .or_else(|| train.route.last())
            .cloned()
            .unwrap_or_default();

        train.current_station = station_code.to_string();
        train.next_station = next;
        true
    }

    /// Updates status and/or delay. Absent fields keep their current value.
    ///
    /// Returns `false` only when the train is unknown.
    pub fn update_status(
        &mut self,
        id: &str,
        status: Option<TrainStatus>,
        delay: Option<u32>,
    ) -> bool {
        let Some(train) = self.get_mut(id) else {
            return false;
        };
        if let Some(status) = status {
            train.status = status;
        }
        if let Some(delay) = delay {
            train.delay = delay;
        }
        true
    }

    /// Sets a train's priority, clamped into `1..=10`.
    pub fn set_priority(&mut self, id: &str, priority: i64) -> bool {
        let Some(train) = self.get_mut(id) else {
            return false;
        };
        let clamped = clamp_priority(priority);
        if i64::from(clamped) != priority {
            log::warn!("Clamped priority {priority} for {id} to {clamped}");
        }
        train.priority = clamped;
        true
    }

    /// Assigns (or clears) the platform at the train's current station.
    pub fn set_platform(&mut self, id: &str, platform: Option<String>) -> bool {
        let Some(train) = self.get_mut(id) else {
            return false;
        };
        train.platform = platform.filter(|p| !p.is_empty());
        true
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use railway_ops_models::{Coordinates, Train, TrainStatus, TrainType};

    pub fn train(id: &str, route: &[&str]) -> Train {
        Train {
            id: id.to_string(),
            number: format!("N{id}"),
            name: id.to_string(),
            train_type: TrainType::Emu,
            status: TrainStatus::OnTime,
            current_station: route[0].to_string(),
            next_station: route.get(1).unwrap_or(&route[0]).to_string(),
            speed: 40,
            delay: 0,
            passenger_load: 50,
            platform: Some("1".to_string()),
            estimated_arrival: "10:00".to_string(),
            estimated_departure: "10:05".to_string(),
            route: route.iter().map(ToString::to_string).collect(),
            priority: 5,
            coordinates: Coordinates { lat: 0.0, lng: 0.0 },
        }
    }
}
