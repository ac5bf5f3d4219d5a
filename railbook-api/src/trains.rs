use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use railbook_catalog::{ClassRow, Train, TravelClass};
use railbook_core::search::{weekday_name, TrainSearchQuery};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ClassRowResponse {
    pub class: TravelClass,
    pub price: i64,
    pub seats_available: i32,
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub id: Uuid,
    pub number: String,
    pub name: String,
    pub from: railbook_catalog::RouteEndpoint,
    pub to: railbook_catalog::RouteEndpoint,
    pub departure_time: chrono::DateTime<chrono::Utc>,
    pub arrival_time: chrono::DateTime<chrono::Utc>,
    pub duration: String,
    pub distance_km: i32,
    pub classes: Vec<ClassRowResponse>,
    pub days: Vec<String>,
    pub is_active: bool,
}

impl TrainResponse {
    pub fn of(train: &Train) -> Self {
        Self {
            id: train.id,
            number: train.number.clone(),
            name: train.name.clone(),
            from: train.from.clone(),
            to: train.to.clone(),
            departure_time: train.departure_time,
            arrival_time: train.arrival_time,
            duration: train.duration.clone(),
            distance_km: train.distance_km,
            classes: train
                .classes
                .iter()
                .map(|row: &ClassRow| ClassRowResponse {
                    class: row.class,
                    price: row.price,
                    seats_available: row.seats_available,
                })
                .collect(),
            days: train.days.iter().map(|&d| weekday_name(d).to_string()).collect(),
            is_active: train.is_active,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trains))
        .route("/search", post(search_trains))
        .route("/{id}", get(get_train))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/trains
pub async fn list_trains(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrainResponse>>, ApiError> {
    let trains = state
        .trains
        .list_active()
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(trains.iter().map(TrainResponse::of).collect()))
}

/// POST /api/trains/search
pub async fn search_trains(
    State(state): State<AppState>,
    Json(query): Json<TrainSearchQuery>,
) -> Result<Json<Vec<TrainResponse>>, ApiError> {
    let trains = state
        .trains
        .search_trains(&query)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(trains.iter().map(TrainResponse::of).collect()))
}

/// GET /api/trains/{id}
pub async fn get_train(
    State(state): State<AppState>,
    Path(train_id): Path<Uuid>,
) -> Result<Json<TrainResponse>, ApiError> {
    let train = state
        .trains
        .get_train(train_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("Train not found".to_string()))?;
    Ok(Json(TrainResponse::of(&train)))
}
