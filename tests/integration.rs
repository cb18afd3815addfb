use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use saferide::api::rest::router;
use saferide::catalog::drivers::DriverCatalog;
use saferide::config::SimulationSettings;
use saferide::engine::notify::Notifier;
use saferide::models::event::{BookingEvent, Severity};
use saferide::state::AppState;
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    fn titles(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }

    fn severity_of(&self, title: &str) -> Option<Severity> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .find(|(sent, _)| sent == title)
            .map(|(_, severity)| *severity)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, _booking_id: Uuid, title: &str, _message: &str, severity: Severity) {
        self.sent.lock().unwrap().push((title.to_string(), severity));
    }
}

fn settings() -> SimulationSettings {
    SimulationSettings {
        rng_seed: Some(42),
        ..SimulationSettings::default()
    }
}

fn setup() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(settings(), 1024));
    (router(state.clone()), state)
}

fn setup_with_notifier() -> (axum::Router, Arc<AppState>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = Arc::new(AppState::new(settings(), 1024).with_notifier(notifier.clone()));
    (router(state.clone()), state, notifier)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    empty_request("GET", uri)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn create_booking(app: &axum::Router) -> String {
    let (status, body) = send(app, empty_request("POST", "/bookings")).await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

async fn set_locations(app: &axum::Router, id: &str, pickup: &str, destination: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "PATCH",
            &format!("/bookings/{id}/locations"),
            json!({ "pickup": pickup, "destination": destination }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

async fn advance(app: &axum::Router, id: &str) -> (StatusCode, Value) {
    send(app, empty_request("POST", &format!("/bookings/{id}/advance"))).await
}

/// Walks a fresh booking up to the driver stage.
async fn booking_at_driver_stage(app: &axum::Router) -> String {
    let id = create_booking(app).await;
    set_locations(app, &id, "Delhi, Delhi", "Mumbai, Maharashtra").await;
    for expected in ["pricing", "payment", "driver"] {
        let (status, body) = advance(app, &id).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], expected);
    }
    id
}

/// Confirms with driver 1 once the estimate has resolved.
async fn confirmed_booking(app: &axum::Router) -> String {
    let id = booking_at_driver_stage(app).await;
    sleep(Duration::from_millis(1_600)).await;
    let (status, _) = send(
        app,
        json_request(
            "PATCH",
            &format!("/bookings/{id}/driver"),
            json!({ "driver_id": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app, empty_request("POST", &format!("/bookings/{id}/confirm"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stage"], "tracking");
    assert_eq!(body["arrival"]["phase"], "pickup");
    assert_eq!(body["arrival"]["progress"], 0);
    assert_eq!(body["arrival"]["arrived"], false);
    assert_eq!(body["arrival"]["eta_minutes"], 3);
    id
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["bookings"], 0);
    assert_eq!(body["drivers"], 8);
    assert_eq!(body["active_simulations"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _state) = setup();
    create_booking(&app).await;
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("active_simulations"));
    assert!(body.contains("bookings_total{outcome=\"created\"} 1"));
}

#[tokio::test]
async fn new_booking_starts_at_location() {
    let (app, _state) = setup();
    let (status, body) = send(&app, empty_request("POST", "/bookings")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stage"], "location");
    assert_eq!(body["progress_percent"], 20);
    assert_eq!(body["ride_class"], "standard");
    assert_eq!(body["payment_method"], "card");
    assert_eq!(body["estimate"]["status"], "absent");
    assert_eq!(body["sos"]["state"], "idle");
    assert!(body["selected_driver_id"].is_null());
}

#[tokio::test]
async fn get_unknown_booking_returns_404() {
    let (app, _state) = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/bookings/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn advance_with_empty_pickup_returns_422() {
    let (app, _state) = setup();
    let id = create_booking(&app).await;
    set_locations(&app, &id, "", "Mumbai, Maharashtra").await;

    let (status, body) = advance(&app, &id).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("pickup"));

    let (_, body) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    assert_eq!(body["stage"], "location");
}

#[tokio::test(start_paused = true)]
async fn estimate_resolves_after_latency() {
    let (app, state) = setup();
    let mut events = state.events_tx.subscribe();
    let id = create_booking(&app).await;

    let body = set_locations(&app, &id, "Delhi, Delhi", "Mumbai, Maharashtra").await;
    assert_eq!(body["estimate"]["status"], "calculating");

    sleep(Duration::from_millis(1_400)).await;
    let (_, body) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    assert_eq!(body["estimate"]["status"], "calculating");

    sleep(Duration::from_millis(200)).await;
    let (_, body) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    let breakdown = &body["estimate"]["breakdown"];
    assert_eq!(body["estimate"]["status"], "ready");
    assert_eq!(breakdown["base_price"], 8.0);
    assert_eq!(breakdown["safety_fee"], 2.5);

    let km = breakdown["distance_km"].as_f64().unwrap();
    assert!((5.0..30.0).contains(&km));
    let surge = breakdown["surge_multiplier"].as_f64().unwrap();
    let expected = (8.0 + km * 0.8 + (km / 30.0 * 60.0) * 0.2 + 2.5) * surge;
    assert!((breakdown["total_price"].as_f64().unwrap() - expected).abs() < 0.01);

    let event = events.recv().await.unwrap();
    assert!(matches!(event, BookingEvent::EstimateReady { .. }));
}

#[tokio::test(start_paused = true)]
async fn clearing_a_location_drops_the_pending_estimate() {
    let (app, _state) = setup();
    let id = create_booking(&app).await;

    set_locations(&app, &id, "Delhi, Delhi", "Mumbai, Maharashtra").await;
    let body = set_locations(&app, &id, "Delhi, Delhi", "").await;
    assert_eq!(body["estimate"]["status"], "absent");

    sleep(Duration::from_secs(3)).await;
    let (_, body) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    assert_eq!(body["estimate"]["status"], "absent");
}

#[tokio::test(start_paused = true)]
async fn ride_class_change_recomputes_estimate() {
    let (app, _state) = setup();
    let id = create_booking(&app).await;
    set_locations(&app, &id, "Pune, Maharashtra", "Thane, Maharashtra").await;
    advance(&app, &id).await;

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/bookings/{id}/ride-class"),
            json!({ "ride_class": "women-only" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ride_class"], "women-only");
    assert_eq!(body["estimate"]["status"], "calculating");

    sleep(Duration::from_millis(1_600)).await;
    let (_, body) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    assert_eq!(body["estimate"]["breakdown"]["base_price"], 10.0);
}

#[tokio::test]
async fn locations_are_locked_after_leaving_location_stage() {
    let (app, _state) = setup();
    let id = create_booking(&app).await;
    set_locations(&app, &id, "Agra, Uttar Pradesh", "Jaipur, Rajasthan").await;
    advance(&app, &id).await;

    let (status, _) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/bookings/{id}/locations"),
            json!({ "pickup": "Patna, Bihar", "destination": "Ranchi, Jharkhand" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn oversized_location_returns_400() {
    let (app, _state) = setup();
    let id = create_booking(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/bookings/{id}/locations"),
            json!({ "pickup": "x".repeat(500), "destination": "Jaipur, Rajasthan" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("pickup"));
}

#[tokio::test]
async fn progress_follows_the_stage() {
    let (app, _state) = setup();
    let id = create_booking(&app).await;
    set_locations(&app, &id, "Agra, Uttar Pradesh", "Jaipur, Rajasthan").await;

    for expected in [40, 60, 80] {
        let (_, body) = advance(&app, &id).await;
        assert_eq!(body["progress_percent"], expected);
    }
}

#[tokio::test]
async fn confirm_without_driver_returns_422() {
    let (app, _state) = setup();
    let id = booking_at_driver_stage(&app).await;

    let (status, _) = send(&app, empty_request("POST", &format!("/bookings/{id}/confirm"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = advance(&app, &id).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn women_only_booking_rejects_ineligible_driver() {
    let (app, _state) = setup();
    let id = create_booking(&app).await;
    set_locations(&app, &id, "Delhi, Delhi", "Gurgaon, Haryana").await;
    send(
        &app,
        json_request(
            "PATCH",
            &format!("/bookings/{id}/ride-class"),
            json!({ "ride_class": "women-only" }),
        ),
    )
    .await;
    for _ in 0..3 {
        advance(&app, &id).await;
    }

    let (status, drivers) = send(&app, get_request(&format!("/bookings/{id}/drivers"))).await;
    assert_eq!(status, StatusCode::OK);
    let drivers = drivers.as_array().unwrap();
    assert!(!drivers.is_empty());
    for driver in drivers {
        let specialties = driver["specialties"].as_array().unwrap();
        assert!(specialties.iter().any(|s| s == "Women-Only"));
    }

    let (status, _) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/bookings/{id}/driver"),
            json!({ "driver_id": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/bookings/{id}/driver"),
            json!({ "driver_id": 99 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/bookings/{id}/driver"),
            json!({ "driver_id": 4 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected_driver_id"], 4);
}

#[tokio::test(start_paused = true)]
async fn advancing_from_driver_reports_the_pickup_leg() {
    let (app, _state) = setup();
    let id = booking_at_driver_stage(&app).await;
    send(
        &app,
        json_request(
            "PATCH",
            &format!("/bookings/{id}/driver"),
            json!({ "driver_id": 2 }),
        ),
    )
    .await;

    let (status, body) = advance(&app, &id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stage"], "tracking");
    assert_eq!(body["arrival"]["phase"], "pickup");
    assert_eq!(body["arrival"]["progress"], 0);
    assert_eq!(body["arrival"]["status"], "Driver en route to pickup");
}

#[tokio::test(start_paused = true)]
async fn ride_completes_after_pickup_and_journey() {
    let (app, state, notifier) = setup_with_notifier();
    let id = confirmed_booking(&app).await;

    let (_, body) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    assert_eq!(body["progress_percent"], 100);
    assert!(!body["confirmed_at"].is_null());
    let trip_minutes = body["estimate"]["breakdown"]["estimated_minutes"].clone();

    let (status, _) = advance(&app, &id).await;
    assert_eq!(status, StatusCode::CONFLICT);

    sleep(Duration::from_millis(25_500)).await;
    let (_, body) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    assert_eq!(body["stage"], "tracking");
    assert_eq!(body["arrival"]["phase"], "pickup");
    assert_eq!(body["arrival"]["progress"], 50);
    assert_eq!(body["arrival"]["eta_minutes"], 2);

    sleep(Duration::from_secs(25)).await;
    let (_, body) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    assert_eq!(body["stage"], "tracking");
    assert_eq!(body["arrival"]["phase"], "journey");
    assert_eq!(body["arrival"]["progress"], 0);
    assert_eq!(body["arrival"]["arrived"], true);
    assert_eq!(body["arrival"]["status"], "In transit to destination");
    assert_eq!(body["arrival"]["eta_minutes"], trip_minutes);
    assert!(notifier.titles().contains(&"Driver Arrived".to_string()));
    assert!(!notifier.titles().contains(&"Trip Completed".to_string()));

    sleep(Duration::from_secs(50)).await;
    let (_, body) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    assert_eq!(body["stage"], "completed");
    assert_eq!(body["progress_percent"], 100);
    assert_eq!(body["arrival"]["phase"], "arrived");
    assert_eq!(body["arrival"]["progress"], 100);
    assert_eq!(body["arrival"]["eta_minutes"], 0);

    let titles = notifier.titles();
    assert_eq!(titles.iter().filter(|t| *t == "Driver Arrived").count(), 1);
    assert_eq!(titles.iter().filter(|t| *t == "Trip Completed").count(), 1);
    assert!(titles.contains(&"Booking Confirmed!".to_string()));
    assert_eq!(state.metrics.active_simulations.get(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelling_mid_arrival_stops_every_tick() {
    let (app, state) = setup();
    let id = confirmed_booking(&app).await;
    let mut events = state.events_tx.subscribe();

    sleep(Duration::from_millis(25_500)).await;
    let (status, body) = send(&app, empty_request("DELETE", &format!("/bookings/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["arrival"]["progress"], 50);

    let mut last_progress = 0;
    while let Ok(event) = events.try_recv() {
        if let BookingEvent::ArrivalProgress { progress, .. } = event {
            last_progress = progress;
        }
    }
    assert_eq!(last_progress, 50);

    sleep(Duration::from_secs(60)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(state.metrics.active_simulations.get(), 0);

    let (status, _) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn live_tracking_requires_a_confirmed_ride() {
    let (app, _state) = setup();
    let id = booking_at_driver_stage(&app).await;

    let (status, _) = send(&app, empty_request("POST", &format!("/bookings/{id}/tracking"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test(start_paused = true)]
async fn stopping_live_tracking_halts_updates() {
    let (app, _state, notifier) = setup_with_notifier();
    let id = confirmed_booking(&app).await;

    let (status, body) = send(&app, empty_request("POST", &format!("/bookings/{id}/tracking"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracking"]["active"], true);

    let (status, _) = send(&app, empty_request("POST", &format!("/bookings/{id}/tracking"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    sleep(Duration::from_millis(6_500)).await;
    let (status, body) = send(&app, empty_request("DELETE", &format!("/bookings/{id}/tracking"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracking"]["active"], false);
    assert_eq!(body["tracking"]["updates"], 3);

    sleep(Duration::from_secs(10)).await;
    let (_, body) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    assert_eq!(body["tracking"]["updates"], 3);

    let titles = notifier.titles();
    assert!(titles.contains(&"Live Tracking Started".to_string()));
    assert!(titles.contains(&"Tracking Stopped".to_string()));

    let (status, _) = send(&app, empty_request("DELETE", &format!("/bookings/{id}/tracking"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test(start_paused = true)]
async fn sos_alerts_contacts_after_countdown() {
    let (app, _state, notifier) = setup_with_notifier();
    let id = create_booking(&app).await;

    let (status, body) = send(&app, empty_request("POST", &format!("/bookings/{id}/sos"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sos"]["state"], "counting_down");
    assert_eq!(body["sos"]["remaining_secs"], 5);

    let (status, _) = send(&app, empty_request("POST", &format!("/bookings/{id}/sos"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    sleep(Duration::from_millis(2_500)).await;
    let (_, body) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    assert_eq!(body["sos"]["remaining_secs"], 3);

    sleep(Duration::from_secs(3)).await;
    let (_, body) = send(&app, get_request(&format!("/bookings/{id}"))).await;
    assert_eq!(body["sos"]["state"], "sent");
    assert_eq!(
        notifier.severity_of("Emergency Alert Sent"),
        Some(Severity::Destructive)
    );
}

#[tokio::test(start_paused = true)]
async fn cancelled_sos_never_alerts() {
    let (app, _state, notifier) = setup_with_notifier();
    let id = create_booking(&app).await;

    send(&app, empty_request("POST", &format!("/bookings/{id}/sos"))).await;
    sleep(Duration::from_secs(2)).await;

    let (status, body) = send(&app, empty_request("DELETE", &format!("/bookings/{id}/sos"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sos"]["state"], "cancelled");

    sleep(Duration::from_secs(10)).await;
    assert!(notifier.severity_of("Emergency Alert Sent").is_none());

    let (status, _) = send(&app, empty_request("DELETE", &format!("/bookings/{id}/sos"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test(start_paused = true)]
async fn places_suggestions_are_capped() {
    let (app, _state) = setup();

    let (status, body) = send(&app, get_request("/places?q=uttar")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);

    let (_, body) = send(&app, get_request("/places?q=de")).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn driver_catalog_lookup() {
    let (app, _state) = setup();

    let (status, body) = send(&app, get_request("/drivers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 8);

    let (status, body) = send(&app, get_request("/drivers/7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Rajesh Kumar");
    assert!(!body["accessibility_features"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, get_request("/drivers/404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn safety_contacts_are_listed() {
    let (app, _state) = setup();
    let (status, body) = send(&app, get_request("/safety/contacts")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trusted_contacts"].as_array().unwrap().len(), 3);
    assert_eq!(body["police_stations"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn booking_drivers_come_from_the_configured_catalog() {
    let accessible_only: Vec<_> = DriverCatalog::demo()
        .all()
        .iter()
        .filter(|driver| driver.has_specialty("Accessible"))
        .cloned()
        .collect();
    let state = Arc::new(
        AppState::new(settings(), 1024).with_drivers(DriverCatalog::new(accessible_only)),
    );
    let app = router(state);
    let id = create_booking(&app).await;

    let (status, drivers) = send(&app, get_request(&format!("/bookings/{id}/drivers"))).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = drivers
        .as_array()
        .unwrap()
        .iter()
        .map(|driver| driver["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Sarah Johnson", "Rajesh Kumar", "Sunita Yadav"]);
}
