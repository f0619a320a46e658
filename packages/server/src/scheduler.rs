//! Background tickers.
//!
//! Each ticker calls the same [`AppState`] method a handler would, so a
//! tick and a request never disagree on how state is recomputed.

use std::time::Duration;

use actix_web::web;
use chrono::Utc;

use crate::AppState;
use crate::config::ServerConfig;

fn spawn_ticker(
    name: &'static str,
    period: Duration,
    state: web::Data<AppState>,
    pass: fn(&AppState) -> Result<String, crate::ApiError>,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // first tick completes immediately; startup already seeded the state
        interval.tick().await;

        loop {
            interval.tick().await;
            match pass(&state) {
                Ok(summary) => log::debug!("{name} tick: {summary}"),
                Err(e) => log::error!("{name} tick failed: {e}"),
            }
        }
    });
}

fn weather_pass(state: &AppState) -> Result<String, crate::ApiError> {
    let changed = state.tick_weather(Utc::now())?;
    Ok(if changed { "changed" } else { "unchanged" }.to_string())
}

fn safety_pass(state: &AppState) -> Result<String, crate::ApiError> {
    let alerts = state.run_safety_check(Utc::now())?;
    Ok(format!("{} active alerts", alerts.len()))
}

fn analysis_pass(state: &AppState) -> Result<String, crate::ApiError> {
    let (recommendations, conflicts) = state.refresh_analysis(Utc::now())?;
    Ok(format!(
        "{} recommendations, {} conflicts",
        recommendations.len(),
        conflicts.len()
    ))
}

/// Starts the weather, safety and analysis tickers.
pub fn start(state: &web::Data<AppState>, config: &ServerConfig) {
    log::info!(
        "Tickers: weather {:?}, safety {:?}, analysis {:?}",
        config.weather_tick,
        config.safety_tick,
        config.analysis_tick
    );
    spawn_ticker("weather", config.weather_tick, state.clone(), weather_pass);
    spawn_ticker("safety", config.safety_tick, state.clone(), safety_pass);
    spawn_ticker("analysis", config.analysis_tick, state.clone(), analysis_pass);
}
