#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the railway operations dashboard.
//!
//! Serves the JSON API under `/api` from in-memory state containers and,
//! optionally, the prebuilt dashboard bundle. Background tickers keep the
//! weather, safety alerts and analysis fresh between requests.

pub mod config;
mod error;
mod handlers;
pub mod interactive;
mod scheduler;
mod state;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use state::AppState;

/// Registers the API routes and the extractor error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(format!("Invalid request body: {err}")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(format!("Invalid query: {err}")).into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .service(
                web::resource("/trains")
                    .route(web::get().to(handlers::trains))
                    .route(web::put().to(handlers::update_train))
                    .route(web::post().to(handlers::train_action)),
            )
            .service(
                web::resource("/weather")
                    .route(web::get().to(handlers::weather))
                    .route(web::post().to(handlers::weather_action)),
            )
            .service(
                web::resource("/safety")
                    .route(web::get().to(handlers::safety))
                    .route(web::post().to(handlers::safety_action))
                    .route(web::patch().to(handlers::resolve_alert)),
            )
            .route("/stations", web::get().to(handlers::stations))
            .service(
                web::resource("/ai")
                    .route(web::get().to(handlers::ai))
                    .route(web::post().to(handlers::ai_action)),
            )
            .service(
                web::resource("/metrics")
                    .route(web::get().to(handlers::metrics))
                    .route(web::post().to(handlers::metrics_action)),
            ),
    );
}

/// Starts the railway operations API server.
///
/// Reads [`ServerConfig`] from the environment, seeds the state
/// containers, starts the background tickers and runs the HTTP server.
/// The caller provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// * If the configuration is invalid
/// * If the HTTP server fails to bind or encounters a runtime error
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    log::info!("Seeding state (seed {})...", config.seed);
    let state = web::Data::new(AppState::new(config.seed));

    scheduler::start(&state, &config);

    let static_dir = config.static_dir.clone();
    if !static_dir.is_dir() {
        log::warn!(
            "Static directory {} not found; only the API will be served",
            static_dir.display()
        );
    }

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        let app = App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure);

        // Serve frontend static files (production)
        if static_dir.is_dir() {
            app.service(Files::new("/", &static_dir).index_file("index.html"))
        } else {
            app
        }
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use chrono::Utc;
    use railway_ops_models::{
        Coordinates, Train, TrainStatus, TrainType, WeatherCondition, WeatherImpact,
        WeatherSnapshot,
    };
    use railway_ops_safety::SafetyMonitor;
    use railway_ops_trains::TrainRegistry;
    use railway_ops_weather::WeatherGenerator;
    use serde_json::{Value, json};

    use super::*;

    fn train(
        id: &str,
        train_type: TrainType,
        route: &[&str],
        arrival: &str,
        priority: u8,
        load: u32,
    ) -> Train {
        Train {
            id: id.to_string(),
            number: format!("N{id}"),
            name: id.to_string(),
            train_type,
            status: TrainStatus::OnTime,
            current_station: route[0].to_string(),
            next_station: route[1].to_string(),
            speed: 40,
            delay: 0,
            passenger_load: load,
            platform: Some("1".to_string()),
            estimated_arrival: arrival.to_string(),
            estimated_departure: arrival.to_string(),
            route: route.iter().map(ToString::to_string).collect(),
            priority,
            coordinates: Coordinates { lat: 13.08, lng: 80.27 },
        }
    }

    /// Two trains sharing platform 1 at MAS under clear skies.
    fn state() -> web::Data<AppState> {
        let now = Utc::now();
        let trains = TrainRegistry::from_trains(vec![
            train("EMU-001", TrainType::Emu, &["MAS", "PER", "VLK"], "10:00", 5, 60),
            train("EXP-001", TrainType::Express, &["MAS", "VLK", "KOK"], "11:00", 7, 80),
        ]);
        let weather = WeatherGenerator::with_snapshot(
            1,
            WeatherSnapshot {
                temperature: 28,
                condition: WeatherCondition::Clear,
                visibility: 10.0,
                wind_speed: 10,
                humidity: 60,
                impact: WeatherImpact::Normal,
            },
            now,
        );
        web::Data::new(AppState::from_parts(trains, weather, SafetyMonitor::new(now), 3))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn health() {
        let app = app!(state());
        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/health").to_request())
                .await;
        assert_eq!(body["healthy"], true);
    }

    #[actix_web::test]
    async fn platform_conflict_is_reported() {
        let app = app!(state());

        let req = test::TestRequest::get()
            .uri("/api/ai?action=conflicts")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 1);
        let conflict = &body["data"][0];
        assert_eq!(conflict["type"], "Platform");
        assert_eq!(conflict["station"], "MAS");
        assert_eq!(conflict["trains"], json!(["EMU-001", "EXP-001"]));
        // max(5, 7) + (60 + 80) / 100
        assert_eq!(conflict["priority"], 8);

        let req = test::TestRequest::get()
            .uri("/api/ai?action=conflicts&conflictType=Timing")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 0);

        let req = test::TestRequest::get()
            .uri("/api/ai?action=conflicts")
            .to_request();
        let again: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(again["data"][0]["id"], conflict["id"]);

        let id = conflict["id"].as_str().unwrap();
        let req = test::TestRequest::get()
            .uri(&format!("/api/ai?id={id}"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["id"], id);
    }

    #[actix_web::test]
    async fn unknown_filters_are_rejected() {
        let app = app!(state());
        for uri in [
            "/api/trains?type=Maglev",
            "/api/safety?severity=Extreme",
            "/api/ai?action=conflicts&conflictType=Bogus",
            "/api/ai?action=dance",
        ] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["success"], false);
        }
    }

    #[actix_web::test]
    async fn train_lookup_and_filters() {
        let app = app!(state());

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/trains?type=EMU").to_request(),
        )
        .await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["id"], "EMU-001");

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/trains?station=KOK").to_request(),
        )
        .await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["id"], "EXP-001");

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/trains?id=EMU-999").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn put_delay_then_get() {
        let app = app!(state());

        let req = test::TestRequest::put()
            .uri("/api/trains")
            .set_json(json!({ "trainId": "EMU-001", "delay": 10 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["delay"], 10);

        let req = test::TestRequest::get()
            .uri("/api/trains?id=EMU-001")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["delay"], 10);
        assert_eq!(body["data"]["status"], "On Time");
    }

    #[actix_web::test]
    async fn put_clamps_priority_and_moves_train() {
        let app = app!(state());

        let req = test::TestRequest::put()
            .uri("/api/trains")
            .set_json(json!({
                "trainId": "EMU-001",
                "priority": 42,
                "stationCode": "PER",
                "status": "Delayed"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["priority"], 10);
        assert_eq!(body["data"]["currentStation"], "PER");
        assert_eq!(body["data"]["nextStation"], "VLK");
        assert_eq!(body["data"]["status"], "Delayed");
    }

    #[actix_web::test]
    async fn put_rejections() {
        let app = app!(state());

        let req = test::TestRequest::put()
            .uri("/api/trains")
            .set_json(json!({ "delay": 10 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri("/api/trains")
            .set_json(json!({ "trainId": "EMU-404", "delay": 10 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        // off-route move with nothing else to apply
        let req = test::TestRequest::put()
            .uri("/api/trains")
            .set_json(json!({ "trainId": "EMU-001", "stationCode": "GPD" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::put()
            .uri("/api/trains")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn resolve_then_lookup_is_not_found() {
        let app = app!(state());

        let req = test::TestRequest::patch()
            .uri("/api/safety")
            .set_json(json!({ "alertId": "ALERT-001", "action": "resolve" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Alert resolved successfully");

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/safety?id=ALERT-001").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/safety").to_request(),
        )
        .await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["id"], "ALERT-002");

        let req = test::TestRequest::patch()
            .uri("/api/safety")
            .set_json(json!({ "alertId": "ALERT-001" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::patch()
            .uri("/api/safety")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn create_alert_and_run_check() {
        let app = app!(state());

        let req = test::TestRequest::post()
            .uri("/api/safety")
            .set_json(json!({ "action": "create", "type": "Track", "severity": "High" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/safety")
            .set_json(json!({
                "type": "Emergency",
                "severity": "Critical",
                "title": "Obstruction on line",
                "affectedStations": ["PER"]
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["type"], "Emergency");
        assert_eq!(body["data"]["resolved"], false);

        let req = test::TestRequest::post()
            .uri("/api/safety")
            .set_json(json!({ "action": "run-check" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let titles: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|a| a["title"].as_str())
            .collect();
        assert!(titles.contains(&"Platform Conflict"));
        assert!(titles.contains(&"Obstruction on line"));
        assert_eq!(body["count"], 4);

        // a second pass does not duplicate the platform alert
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/safety?runCheck=true").to_request(),
        )
        .await;
        assert_eq!(body["count"], 4);
    }

    #[actix_web::test]
    async fn weather_and_stations() {
        let app = app!(state());

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/weather").to_request(),
        )
        .await;
        assert_eq!(body["data"]["condition"], "Clear");
        assert_eq!(body["data"]["speedRestriction"], 120);
        assert_eq!(
            body["data"]["impactDescription"],
            "Normal weather conditions. No restrictions."
        );

        let req = test::TestRequest::post()
            .uri("/api/weather")
            .set_json(json!({ "action": "refresh" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["speedRestriction"].is_u64());

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/stations").to_request(),
        )
        .await;
        assert_eq!(body["count"], 14);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/stations?code=MAS").to_request(),
        )
        .await;
        assert_eq!(body["data"]["code"], "MAS");

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/stations?code=XYZ").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn what_if_leaves_fleet_untouched() {
        let app = app!(state());

        let req = test::TestRequest::post()
            .uri("/api/ai")
            .set_json(json!({
                "action": "what-if-analysis",
                "scenario": { "trainId": "EMU-001", "newPriority": 9, "delayMinutes": 15 }
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let impact = body["data"]["impact"].as_str().unwrap().to_string();
        assert!(impact.contains("Priority change: 5 → 9"));
        assert!(impact.contains("Additional delay: +15 minutes"));
        assert_eq!(body["data"]["recommendations"].as_array().unwrap().len(), 2);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/trains?id=EMU-001").to_request(),
        )
        .await;
        assert_eq!(body["data"]["priority"], 5);
        assert_eq!(body["data"]["delay"], 0);

        let req = test::TestRequest::post()
            .uri("/api/ai")
            .set_json(json!({
                "action": "what-if-analysis",
                "scenario": { "trainId": "EMU-001", "newPriority": 9, "delayMinutes": 15 }
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["impact"], impact.as_str());

        let req = test::TestRequest::post()
            .uri("/api/ai")
            .set_json(json!({ "action": "what-if-analysis", "scenario": { "newPriority": 9 } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/ai")
            .set_json(json!({ "action": "what-if-analysis", "scenario": { "trainId": "NOPE" } }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["impact"], "Train not found");

        let req = test::TestRequest::post()
            .uri("/api/ai")
            .set_json(json!({
                "action": "what-if-analysis",
                "scenario": { "trainId": "EMU-001", "newRoute": ["MAS", "XYZ"] }
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Unknown station: XYZ");
    }

    #[actix_web::test]
    async fn ai_refresh_and_metrics() {
        let app = app!(state());

        let req = test::TestRequest::post()
            .uri("/api/ai")
            .set_json(json!({ "action": "refresh" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["conflicts"].as_array().unwrap().len(), 1);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/metrics").to_request(),
        )
        .await;
        let metrics = &body["data"];
        assert_eq!(metrics["activeTrains"], 2);
        assert_eq!(metrics["onTimePerformance"], 100);
        assert_eq!(metrics["activeAlerts"], 2);
        // 60% of 1200 + 80% of 800
        assert_eq!(metrics["passengersToday"], 1360);
        assert_eq!(metrics["ai"]["conflicts"], 1);
        assert_eq!(metrics["ai"]["criticalConflicts"], 1);

        let req = test::TestRequest::post()
            .uri("/api/metrics")
            .set_json(json!({ "action": "historical", "timeRange": 6 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 6);

        let req = test::TestRequest::post()
            .uri("/api/metrics")
            .set_json(json!({ "action": "forecast" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
