use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tokio::time::sleep;

use crate::catalog::safety::SafetyDirectory;
use crate::error::AppError;
use crate::models::driver::{Driver, DriverId};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", get(list_drivers))
        .route("/drivers/:id", get(get_driver))
        .route("/places", get(suggest_places))
        .route("/safety/contacts", get(safety_contacts))
}

#[derive(Deserialize)]
pub struct PlacesQuery {
    #[serde(default)]
    pub q: String,
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Json<Vec<Driver>> {
    Json(state.drivers.all().to_vec())
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<DriverId>,
) -> Result<Json<Driver>, AppError> {
    let driver = state
        .drivers
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("driver {} not found", id)))?;

    Ok(Json(driver.clone()))
}

async fn suggest_places(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlacesQuery>,
) -> Json<Vec<String>> {
    sleep(state.settings.suggestion_delay).await;
    Json(state.places.suggest_places(&query.q))
}

async fn safety_contacts(State(state): State<Arc<AppState>>) -> Json<SafetyDirectory> {
    Json(state.safety.clone())
}
