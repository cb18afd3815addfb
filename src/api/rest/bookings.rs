use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::booking;
use crate::engine::progress::percent;
use crate::error::AppError;
use crate::models::booking::{BookingSession, PaymentMethod, RideClass};
use crate::models::driver::{Driver, DriverId};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/:id", get(get_booking).delete(cancel_booking))
        .route("/bookings/:id/locations", patch(update_locations))
        .route("/bookings/:id/ride-class", patch(set_ride_class))
        .route("/bookings/:id/payment-method", patch(set_payment_method))
        .route("/bookings/:id/advance", post(advance))
        .route("/bookings/:id/drivers", get(eligible_drivers))
        .route("/bookings/:id/driver", patch(select_driver))
        .route("/bookings/:id/confirm", post(confirm))
        .route(
            "/bookings/:id/tracking",
            post(start_tracking).delete(stop_tracking),
        )
        .route("/bookings/:id/sos", post(trigger_sos).delete(cancel_sos))
}

#[derive(Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub session: BookingSession,
    pub progress_percent: u8,
}

impl From<BookingSession> for BookingView {
    fn from(session: BookingSession) -> Self {
        Self {
            progress_percent: percent(session.stage),
            session,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateLocationsRequest {
    #[serde(default)]
    pub pickup: String,
    #[serde(default)]
    pub destination: String,
}

#[derive(Deserialize)]
pub struct RideClassRequest {
    pub ride_class: RideClass,
}

#[derive(Deserialize)]
pub struct PaymentMethodRequest {
    pub payment_method: PaymentMethod,
}

#[derive(Deserialize)]
pub struct SelectDriverRequest {
    pub driver_id: DriverId,
}

type BookingResponse = Result<Json<BookingView>, AppError>;

async fn create_booking(State(state): State<Arc<AppState>>) -> Json<BookingView> {
    Json(booking::create_booking(&state).into())
}

async fn get_booking(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> BookingResponse {
    Ok(Json(booking::get_booking(&state, id)?.into()))
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> BookingResponse {
    Ok(Json(booking::cancel_booking(&state, id)?.into()))
}

async fn update_locations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationsRequest>,
) -> BookingResponse {
    let session = booking::update_locations(&state, id, payload.pickup, payload.destination)?;
    Ok(Json(session.into()))
}

async fn set_ride_class(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RideClassRequest>,
) -> BookingResponse {
    Ok(Json(booking::set_ride_class(&state, id, payload.ride_class)?.into()))
}

async fn set_payment_method(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentMethodRequest>,
) -> BookingResponse {
    let session = booking::set_payment_method(&state, id, payload.payment_method)?;
    Ok(Json(session.into()))
}

async fn advance(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> BookingResponse {
    Ok(Json(booking::advance_booking(&state, id)?.into()))
}

async fn eligible_drivers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Driver>>, AppError> {
    Ok(Json(booking::eligible_drivers(&state, id)?))
}

async fn select_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectDriverRequest>,
) -> BookingResponse {
    Ok(Json(booking::select_driver(&state, id, payload.driver_id)?.into()))
}

async fn confirm(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> BookingResponse {
    Ok(Json(booking::confirm_booking(&state, id)?.into()))
}

async fn start_tracking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> BookingResponse {
    Ok(Json(booking::start_tracking(&state, id)?.into()))
}

async fn stop_tracking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> BookingResponse {
    Ok(Json(booking::stop_tracking(&state, id)?.into()))
}

async fn trigger_sos(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> BookingResponse {
    Ok(Json(booking::trigger_sos(&state, id)?.into()))
}

async fn cancel_sos(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> BookingResponse {
    Ok(Json(booking::cancel_sos(&state, id)?.into()))
}
