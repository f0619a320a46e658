//! Server configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while reading the server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A numeric variable did not parse.
    #[error("Invalid value {value:?} for {var}: {source}")]
    InvalidNumber {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure.
        source: std::num::ParseIntError,
    },
    /// A tick interval was zero.
    #[error("{var} must be greater than zero")]
    ZeroInterval {
        /// Variable name.
        var: &'static str,
    },
}

/// Runtime settings for [`crate::run_server`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Seed for the mock data generators (`RAILWAY_SEED`).
    pub seed: u64,
    /// Weather tick period (`WEATHER_TICK_SECS`).
    pub weather_tick: Duration,
    /// Safety check period (`SAFETY_TICK_SECS`).
    pub safety_tick: Duration,
    /// Analysis refresh period (`ANALYSIS_TICK_SECS`).
    pub analysis_tick: Duration,
    /// Prebuilt dashboard bundle (`STATIC_DIR`).
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// * If a numeric variable is set but does not parse
    /// * If a tick interval is zero
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable if it is set.
    ///
    /// # Errors
    ///
    /// * If a numeric variable is set but does not parse
    /// * If a tick interval is zero
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let seed = match lookup("RAILWAY_SEED") {
            Some(value) => parse_number("RAILWAY_SEED", value)?,
            None => rand::random(),
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT").map_or(Ok(8080), |v| parse_number("PORT", v))?,
            seed,
            weather_tick: tick(&lookup, "WEATHER_TICK_SECS", 300)?,
            safety_tick: tick(&lookup, "SAFETY_TICK_SECS", 60)?,
            analysis_tick: tick(&lookup, "ANALYSIS_TICK_SECS", 120)?,
            static_dir: lookup("STATIC_DIR").map_or_else(|| PathBuf::from("app/dist"), PathBuf::from),
        })
    }
}

fn parse_number<T: std::str::FromStr<Err = std::num::ParseIntError>>(
    var: &'static str,
    value: String,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidNumber { var, value, source })
}

fn tick(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default_secs: u64,
) -> Result<Duration, ConfigError> {
    let secs = lookup(var).map_or(Ok(default_secs), |v| parse_number(var, v))?;
    if secs == 0 {
        return Err(ConfigError::ZeroInterval { var });
    }
    Ok(Duration::from_secs(secs))
}
