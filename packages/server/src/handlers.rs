//! HTTP handler functions for the railway operations API.

use std::str::FromStr;

use actix_web::{HttpResponse, web};
use chrono::Utc;
use railway_ops_analysis::metrics::{compute_metrics, historical_series};
use railway_ops_analysis::recommendations::{priority_optimization, weather_based_recommendations};
use railway_ops_analysis::{WhatIfScenario, run_what_if};
use railway_ops_models::{AlertSeverity, AlertType, ConflictType, RecommendationType, TrainType};
use railway_ops_safety::AlertDraft;
use railway_ops_server_models::{
    ActionBody, AiPostBody, AiQuery, AiRefreshResponse, ApiHealth, ApiResponse, MetricsPostBody,
    ResolveAlertBody, SafetyPostBody, SafetyQuery, StationQuery, TrainQuery, UpdateTrainBody,
    WeatherResponse,
};

use crate::state::local_hour;
use crate::{ApiError, AppState};

type ApiResult = Result<HttpResponse, ApiError>;

/// Hours of history served when the request does not say.
const DEFAULT_HISTORY_HOURS: u32 = 24;

/// Parses a label-valued filter, rejecting unknown labels.
fn parse_filter<T: FromStr>(what: &str, value: &str) -> Result<T, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown {what}: {value}")))
}

fn invalid_action(action: Option<&str>) -> ApiError {
    ApiError::BadRequest(format!("Invalid action: {}", action.unwrap_or("none")))
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/trains`
///
/// A single train by `id`, or the fleet filtered by `type` or `station`.
pub async fn trains(state: web::Data<AppState>, query: web::Query<TrainQuery>) -> ApiResult {
    let registry = state.trains()?;

    if let Some(id) = &query.id {
        let train = registry
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Train not found".to_string()))?;
        return Ok(HttpResponse::Ok().json(ApiResponse::ok(train)));
    }

    let trains = if let Some(label) = &query.train_type {
        registry.by_type(parse_filter::<TrainType>("train type", label)?)
    } else if let Some(station) = &query.station {
        registry.by_station(station)
    } else {
        registry.snapshot()
    };

    Ok(HttpResponse::Ok().json(ApiResponse::list(trains)))
}

/// `PUT /api/trains`
///
/// Applies any subset of position, status, delay, priority and platform
/// updates to one train.
pub async fn update_train(
    state: web::Data<AppState>,
    body: web::Json<UpdateTrainBody>,
) -> ApiResult {
    let body = body.into_inner();
    let train_id = body
        .train_id
        .clone()
        .ok_or_else(|| ApiError::BadRequest("trainId is required".to_string()))?;

    let mut registry = state.trains_mut()?;
    let mut applied = false;

    if body.has_updates() && registry.get(&train_id).is_some() {
        if let Some(station) = &body.station_code {
            applied |= registry.update_position(&train_id, station);
        }
        if body.status.is_some() || body.delay.is_some() {
            applied |= registry.update_status(&train_id, body.status, body.delay);
        }
        if let Some(priority) = body.priority {
            applied |= registry.set_priority(&train_id, priority);
        }
        if let Some(platform) = body.platform {
            applied |= registry.set_platform(&train_id, Some(platform));
        }
    }

    let updated = registry
        .get(&train_id)
        .filter(|_| applied)
        .cloned()
        .ok_or_else(|| ApiError::NotFound("Train not found or update failed".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(updated)))
}

/// `POST /api/trains`
pub async fn train_action(state: web::Data<AppState>, body: web::Json<ActionBody>) -> ApiResult {
    match body.action.as_deref() {
        Some("refresh") => Ok(HttpResponse::Ok()
            .json(ApiResponse::list(state.trains_snapshot()?).at(Utc::now()))),
        other => Err(invalid_action(other)),
    }
}

fn weather_response(state: &AppState) -> Result<WeatherResponse, ApiError> {
    let generator = state.weather()?;
    let snapshot = generator.current();
    Ok(WeatherResponse {
        impact_description: railway_ops_weather::impact_description(&snapshot),
        speed_restriction: snapshot.impact.speed_restriction(),
        last_update: generator.last_update(),
        snapshot,
    })
}

/// `GET /api/weather`
pub async fn weather(state: web::Data<AppState>) -> ApiResult {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(weather_response(&state)?)))
}

/// `POST /api/weather`
pub async fn weather_action(state: web::Data<AppState>, body: web::Json<ActionBody>) -> ApiResult {
    match body.action.as_deref() {
        Some("refresh") => {
            let now = Utc::now();
            state.refresh_weather(now)?;
            Ok(HttpResponse::Ok().json(ApiResponse::ok(weather_response(&state)?).at(now)))
        }
        other => Err(invalid_action(other)),
    }
}

/// `GET /api/safety`
///
/// A single alert by `id`, the result of a check pass with
/// `runCheck=true`, or the active alerts filtered by `type` or `severity`.
pub async fn safety(state: web::Data<AppState>, query: web::Query<SafetyQuery>) -> ApiResult {
    if let Some(id) = &query.id {
        let alert = state
            .safety()?
            .by_id(id)
            .ok_or_else(|| ApiError::NotFound("Alert not found".to_string()))?;
        return Ok(HttpResponse::Ok().json(ApiResponse::ok(alert)));
    }

    let alerts = if query.wants_check() {
        state.run_safety_check(Utc::now())?
    } else if let Some(label) = &query.alert_type {
        let alert_type = parse_filter::<AlertType>("alert type", label)?;
        state.safety()?.by_type(alert_type)
    } else if let Some(label) = &query.severity {
        let severity = parse_filter::<AlertSeverity>("severity", label)?;
        state.safety()?.by_severity(severity)
    } else {
        state.safety()?.all()
    };

    Ok(HttpResponse::Ok().json(ApiResponse::list(alerts)))
}

fn alert_draft(body: SafetyPostBody) -> Result<AlertDraft, ApiError> {
    match (body.alert_type, body.severity, body.title) {
        (Some(alert_type), Some(severity), Some(title)) if !title.trim().is_empty() => {
            Ok(AlertDraft {
                alert_type,
                severity,
                title,
                description: body.description.unwrap_or_default(),
                affected_trains: body.affected_trains.unwrap_or_default(),
                affected_stations: body.affected_stations.unwrap_or_default(),
            })
        }
        _ => Err(ApiError::BadRequest(
            "Alert type, severity and title are required".to_string(),
        )),
    }
}

/// `POST /api/safety`
///
/// Creates an alert (`action=create` or no action) or runs a check pass
/// (`action=run-check`).
pub async fn safety_action(
    state: web::Data<AppState>,
    body: web::Json<SafetyPostBody>,
) -> ApiResult {
    let body = body.into_inner();
    match body.action.as_deref() {
        Some("run-check") => {
            let now = Utc::now();
            let alerts = state.run_safety_check(now)?;
            Ok(HttpResponse::Ok().json(ApiResponse::list(alerts).at(now)))
        }
        None | Some("create") => {
            let draft = alert_draft(body)?;
            let alert = state.safety_mut()?.create_alert(draft, Utc::now());
            log::info!("Created alert {} ({})", alert.id, alert.title);
            Ok(HttpResponse::Ok().json(ApiResponse::ok(alert)))
        }
        other => Err(invalid_action(other)),
    }
}

/// `PATCH /api/safety`
pub async fn resolve_alert(
    state: web::Data<AppState>,
    body: web::Json<ResolveAlertBody>,
) -> ApiResult {
    if let Some(action) = body.action.as_deref()
        && action != "resolve"
    {
        return Err(invalid_action(Some(action)));
    }
    let alert_id = body
        .alert_id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("alertId is required".to_string()))?;

    if state.safety_mut()?.resolve_alert(alert_id) {
        log::info!("Resolved alert {alert_id}");
        Ok(HttpResponse::Ok().json(ApiResponse::message("Alert resolved successfully")))
    } else {
        Err(ApiError::NotFound("Alert not found".to_string()))
    }
}

/// `GET /api/stations`
pub async fn stations(query: web::Query<StationQuery>) -> ApiResult {
    if let Some(code) = &query.code {
        let station = railway_ops_stations::station_by_code(code)
            .ok_or_else(|| ApiError::NotFound("Station not found".to_string()))?;
        return Ok(HttpResponse::Ok().json(ApiResponse::ok(station)));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::list(
        railway_ops_stations::all_stations().to_vec(),
    )))
}

/// `GET /api/ai`
///
/// Looks up an item by `id`, or serves one of the analysis views selected
/// by `action`; without an action, the stored recommendations filtered by
/// `type`.
pub async fn ai(state: web::Data<AppState>, query: web::Query<AiQuery>) -> ApiResult {
    if let Some(id) = &query.id {
        let item = state
            .analysis()?
            .find(id)
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;
        return Ok(HttpResponse::Ok().json(ApiResponse::ok(item)));
    }

    let now = Utc::now();
    match query.action.as_deref() {
        Some("conflicts") => {
            let kind = query
                .conflict_type
                .as_deref()
                .map(|label| parse_filter::<ConflictType>("conflict type", label))
                .transpose()?;
            let conflicts = state.refresh_conflicts(now)?;
            let conflicts = match kind {
                Some(kind) => state.analysis()?.conflicts_by_type(kind),
                None => conflicts,
            };
            Ok(HttpResponse::Ok().json(ApiResponse::list(conflicts)))
        }
        Some("weather-recommendations") => {
            let trains = state.trains_snapshot()?;
            let weather = state.weather_snapshot()?;
            Ok(HttpResponse::Ok().json(ApiResponse::list(weather_based_recommendations(
                &trains, &weather, now,
            ))))
        }
        Some("priority-optimization") => {
            let trains = state.trains_snapshot()?;
            Ok(HttpResponse::Ok().json(ApiResponse::list(priority_optimization(
                &trains,
                local_hour(),
                now,
            ))))
        }
        None => {
            let analysis = state.analysis()?;
            let recommendations = match &query.recommendation_type {
                Some(label) => analysis.recommendations_by_type(parse_filter::<RecommendationType>(
                    "recommendation type",
                    label,
                )?),
                None => analysis.recommendations().to_vec(),
            };
            Ok(HttpResponse::Ok().json(ApiResponse::list(recommendations)))
        }
        other => Err(invalid_action(other)),
    }
}

/// Rejects a route naming a station that is not on the corridor.
fn check_route(route: &[String]) -> Result<(), ApiError> {
    let known = railway_ops_stations::stations_for_route(route);
    if known.len() == route.len() {
        return Ok(());
    }
    let unknown: Vec<&str> = route
        .iter()
        .map(String::as_str)
        .filter(|code| !known.iter().any(|s| s.code == *code))
        .collect();
    Err(ApiError::BadRequest(format!(
        "Unknown station: {}",
        unknown.join(", ")
    )))
}

/// `POST /api/ai`
///
/// Runs a what-if analysis against a copy of the fleet, or refreshes the
/// stored analysis.
pub async fn ai_action(state: web::Data<AppState>, body: web::Json<AiPostBody>) -> ApiResult {
    let body = body.into_inner();
    let now = Utc::now();

    match body.action.as_deref() {
        Some("what-if-analysis") => {
            let scenario = body.scenario.unwrap_or_default();
            let train_id = scenario
                .train_id
                .ok_or_else(|| ApiError::BadRequest("scenario.trainId is required".to_string()))?;
            if let Some(route) = &scenario.new_route {
                check_route(route)?;
            }
            let scenario = WhatIfScenario {
                train_id,
                new_priority: scenario.new_priority,
                new_route: scenario.new_route,
                delay_minutes: scenario.delay_minutes,
            };

            let trains = state.trains_snapshot()?;
            let result = run_what_if(&trains, &scenario, now);
            Ok(HttpResponse::Ok().json(ApiResponse::ok(result).at(now)))
        }
        Some("refresh") => {
            let (recommendations, conflicts) = state.refresh_analysis(now)?;
            Ok(HttpResponse::Ok().json(
                ApiResponse::ok(AiRefreshResponse {
                    recommendations,
                    conflicts,
                })
                .at(now),
            ))
        }
        other => Err(invalid_action(other)),
    }
}

/// `GET /api/metrics`
pub async fn metrics(state: web::Data<AppState>) -> ApiResult {
    let trains = state.trains_snapshot()?;
    let weather = state.weather_snapshot()?;
    let active_alerts = state.safety()?.active_count();
    let (recommendations, conflicts) = {
        let analysis = state.analysis()?;
        (
            analysis.recommendations().to_vec(),
            analysis.conflicts().to_vec(),
        )
    };

    let metrics = compute_metrics(
        &trains,
        active_alerts,
        &weather,
        &recommendations,
        &conflicts,
    );
    Ok(HttpResponse::Ok().json(ApiResponse::ok(metrics).at(Utc::now())))
}

/// `POST /api/metrics`
pub async fn metrics_action(
    state: web::Data<AppState>,
    body: web::Json<MetricsPostBody>,
) -> ApiResult {
    match body.action.as_deref() {
        Some("historical") => {
            let hours = body.time_range.unwrap_or(DEFAULT_HISTORY_HOURS);
            let now = Utc::now();
            let series = {
                let mut rng = state
                    .history_rng
                    .lock()
                    .map_err(|_| ApiError::internal("history rng lock poisoned"))?;
                historical_series(hours, now, &mut *rng)
            };
            Ok(HttpResponse::Ok().json(ApiResponse::list(series).at(now)))
        }
        other => Err(invalid_action(other)),
    }
}
