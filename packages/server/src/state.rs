//! Shared application state.
//!
//! Each container sits behind its own lock. A method here holds at most one
//! lock at a time: data needed from another container is cloned under that
//! container's read lock and the lock is released before the owning
//! container is written.

use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Local, Timelike as _, Utc};
use railway_ops_analysis::AnalysisEngine;
use railway_ops_models::{Conflict, Recommendation, SafetyAlert, Train, WeatherSnapshot};
use railway_ops_safety::SafetyMonitor;
use railway_ops_trains::TrainRegistry;
use railway_ops_weather::WeatherGenerator;
use rand::SeedableRng as _;
use rand_chacha::ChaCha8Rng;

use crate::ApiError;

/// Every state container the handlers and tickers operate on.
#[derive(Debug)]
pub struct AppState {
    /// The fleet.
    pub trains: RwLock<TrainRegistry>,
    /// Current weather.
    pub weather: RwLock<WeatherGenerator>,
    /// Safety alerts.
    pub safety: RwLock<SafetyMonitor>,
    /// Last analysis pass.
    pub analysis: RwLock<AnalysisEngine>,
    /// Randomness for synthetic history.
    pub history_rng: Mutex<ChaCha8Rng>,
}

fn read<'a, T>(lock: &'a RwLock<T>, name: &str) -> Result<RwLockReadGuard<'a, T>, ApiError> {
    lock.read()
        .map_err(|_| ApiError::internal(format!("{name} lock poisoned")))
}

fn write<'a, T>(lock: &'a RwLock<T>, name: &str) -> Result<RwLockWriteGuard<'a, T>, ApiError> {
    lock.write()
        .map_err(|_| ApiError::internal(format!("{name} lock poisoned")))
}

/// Current hour of the day in the server's local time zone.
#[must_use]
pub fn local_hour() -> u32 {
    Local::now().hour()
}

impl AppState {
    /// Seeds the fleet, weather and alerts, and runs an initial analysis
    /// pass.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let now = Utc::now();
        let trains = TrainRegistry::generate(
            seed,
            railway_ops_stations::all_stations(),
            Local::now().time(),
        );
        log::info!("Generated {} trains (seed {seed})", trains.all().len());

        Self::from_parts(
            trains,
            WeatherGenerator::new(seed.wrapping_add(1), now),
            SafetyMonitor::new(now),
            seed,
        )
    }

    /// Assembles state from prepared containers and runs an initial analysis
    /// pass.
    #[must_use]
    pub fn from_parts(
        trains: TrainRegistry,
        weather: WeatherGenerator,
        safety: SafetyMonitor,
        seed: u64,
    ) -> Self {
        let mut analysis = AnalysisEngine::new();
        analysis.refresh(trains.all(), &weather.current(), local_hour(), Utc::now());

        Self {
            trains: RwLock::new(trains),
            weather: RwLock::new(weather),
            safety: RwLock::new(safety),
            analysis: RwLock::new(analysis),
            history_rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed.wrapping_add(2))),
        }
    }

    /// Read access to the fleet.
    ///
    /// # Errors
    ///
    /// * If the lock is poisoned
    pub fn trains(&self) -> Result<RwLockReadGuard<'_, TrainRegistry>, ApiError> {
        read(&self.trains, "trains")
    }

    /// Write access to the fleet.
    ///
    /// # Errors
    ///
    /// * If the lock is poisoned
    pub fn trains_mut(&self) -> Result<RwLockWriteGuard<'_, TrainRegistry>, ApiError> {
        write(&self.trains, "trains")
    }

    /// Read access to the weather generator.
    ///
    /// # Errors
    ///
    /// * If the lock is poisoned
    pub fn weather(&self) -> Result<RwLockReadGuard<'_, WeatherGenerator>, ApiError> {
        read(&self.weather, "weather")
    }

    /// Read access to the alert list.
    ///
    /// # Errors
    ///
    /// * If the lock is poisoned
    pub fn safety(&self) -> Result<RwLockReadGuard<'_, SafetyMonitor>, ApiError> {
        read(&self.safety, "safety")
    }

    /// Write access to the alert list.
    ///
    /// # Errors
    ///
    /// * If the lock is poisoned
    pub fn safety_mut(&self) -> Result<RwLockWriteGuard<'_, SafetyMonitor>, ApiError> {
        write(&self.safety, "safety")
    }

    /// Read access to the last analysis pass.
    ///
    /// # Errors
    ///
    /// * If the lock is poisoned
    pub fn analysis(&self) -> Result<RwLockReadGuard<'_, AnalysisEngine>, ApiError> {
        read(&self.analysis, "analysis")
    }

    /// An owned copy of the fleet.
    ///
    /// # Errors
    ///
    /// * If the lock is poisoned
    pub fn trains_snapshot(&self) -> Result<Vec<Train>, ApiError> {
        Ok(self.trains()?.snapshot())
    }

    /// An owned copy of the current weather.
    ///
    /// # Errors
    ///
    /// * If the lock is poisoned
    pub fn weather_snapshot(&self) -> Result<WeatherSnapshot, ApiError> {
        Ok(self.weather()?.current())
    }

    /// Possibly replaces the weather; returns whether it changed.
    ///
    /// # Errors
    ///
    /// * If the lock is poisoned
    pub fn tick_weather(&self, now: DateTime<Utc>) -> Result<bool, ApiError> {
        Ok(write(&self.weather, "weather")?.tick(now))
    }

    /// Unconditionally replaces the weather.
    ///
    /// # Errors
    ///
    /// * If the lock is poisoned
    pub fn refresh_weather(&self, now: DateTime<Utc>) -> Result<WeatherSnapshot, ApiError> {
        Ok(write(&self.weather, "weather")?.refresh(now))
    }

    /// Runs a safety pass against snapshots of the fleet and weather.
    ///
    /// # Errors
    ///
    /// * If a lock is poisoned
    pub fn run_safety_check(&self, now: DateTime<Utc>) -> Result<Vec<SafetyAlert>, ApiError> {
        let trains = self.trains_snapshot()?;
        let weather = self.weather_snapshot()?;
        Ok(self.safety_mut()?.run_safety_check(&trains, &weather, now))
    }

    /// Recomputes conflicts against the current fleet and stores them.
    ///
    /// # Errors
    ///
    /// * If a lock is poisoned
    pub fn refresh_conflicts(&self, now: DateTime<Utc>) -> Result<Vec<Conflict>, ApiError> {
        let trains = self.trains_snapshot()?;
        Ok(write(&self.analysis, "analysis")?.refresh_conflicts(&trains, now))
    }

    /// Recomputes recommendations and conflicts.
    ///
    /// # Errors
    ///
    /// * If a lock is poisoned
    pub fn refresh_analysis(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Recommendation>, Vec<Conflict>), ApiError> {
        let trains = self.trains_snapshot()?;
        let weather = self.weather_snapshot()?;
        let mut analysis = write(&self.analysis, "analysis")?;
        analysis.refresh(&trains, &weather, local_hour(), now);
        Ok((
            analysis.recommendations().to_vec(),
            analysis.conflicts().to_vec(),
        ))
    }
}
