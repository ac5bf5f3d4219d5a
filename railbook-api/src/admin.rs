use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use railbook_catalog::{ClassRow, RouteEndpoint, Train, TravelClass};
use railbook_core::search::parse_weekday;
use serde::Deserialize;
use uuid::Uuid;

use crate::bookings::BookingResponse;
use crate::error::ApiError;
use crate::middleware::auth::{admin_auth_middleware, Claims};
use crate::state::AppState;
use crate::trains::TrainResponse;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ClassRowRequest {
    pub class: TravelClass,
    pub price: i64,
    pub seats_available: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateTrainRequest {
    pub number: String,
    pub name: String,
    pub from: RouteEndpoint,
    pub to: RouteEndpoint,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration: String,
    pub distance_km: i32,
    pub classes: Vec<ClassRowRequest>,
    pub days: Vec<String>,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Deserialize)]
pub struct UpdateTrainRequest {
    pub number: Option<String>,
    pub name: Option<String>,
    pub from: Option<RouteEndpoint>,
    pub to: Option<RouteEndpoint>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub duration: Option<String>,
    pub distance_km: Option<i32>,
    pub classes: Option<Vec<ClassRowRequest>>,
    pub days: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/trains", post(create_train))
        .route("/trains/{id}", put(update_train).delete(delete_train))
        .route("/bookings", get(list_all_bookings))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}

fn parse_days(names: &[String]) -> Result<Vec<chrono::Weekday>, ApiError> {
    names
        .iter()
        .map(|name| {
            parse_weekday(name)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid running day: {name}")))
        })
        .collect()
}

fn build_class_rows(rows: &[ClassRowRequest]) -> Result<Vec<ClassRow>, ApiError> {
    let mut seen = Vec::new();
    rows.iter()
        .map(|row| {
            if row.price <= 0 {
                return Err(ApiError::BadRequest(format!(
                    "Price for {} must be positive",
                    row.class
                )));
            }
            if row.seats_available < 0 {
                return Err(ApiError::BadRequest(format!(
                    "Seat count for {} must not be negative",
                    row.class
                )));
            }
            if seen.contains(&row.class) {
                return Err(ApiError::BadRequest(format!(
                    "Duplicate class {}",
                    row.class
                )));
            }
            seen.push(row.class);
            Ok(ClassRow {
                class: row.class,
                price: row.price,
                seats_available: row.seats_available,
            })
        })
        .collect()
}

// ============================================================================
// Train Management Handlers
// ============================================================================

/// POST /api/admin/trains
pub async fn create_train(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTrainRequest>,
) -> Result<Json<TrainResponse>, ApiError> {
    let now = Utc::now();
    let train = Train {
        id: Uuid::new_v4(),
        number: req.number,
        name: req.name,
        from: req.from,
        to: req.to,
        departure_time: req.departure_time,
        arrival_time: req.arrival_time,
        duration: req.duration,
        distance_km: req.distance_km,
        classes: build_class_rows(&req.classes)?,
        days: parse_days(&req.days)?,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state
        .trains
        .create_train(&train)
        .await
        .map_err(ApiError::internal)?;

    tracing::info!(admin = %claims.sub, train = %train.number, "train created");
    Ok(Json(TrainResponse::of(&train)))
}

/// PUT /api/admin/trains/{id}
pub async fn update_train(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(train_id): Path<Uuid>,
    Json(req): Json<UpdateTrainRequest>,
) -> Result<Json<TrainResponse>, ApiError> {
    let mut train = state
        .trains
        .get_train(train_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("Train not found".to_string()))?;

    if let Some(number) = req.number {
        train.number = number;
    }
    if let Some(name) = req.name {
        train.name = name;
    }
    if let Some(from) = req.from {
        train.from = from;
    }
    if let Some(to) = req.to {
        train.to = to;
    }
    if let Some(departure_time) = req.departure_time {
        train.departure_time = departure_time;
    }
    if let Some(arrival_time) = req.arrival_time {
        train.arrival_time = arrival_time;
    }
    if let Some(duration) = req.duration {
        train.duration = duration;
    }
    if let Some(distance_km) = req.distance_km {
        train.distance_km = distance_km;
    }
    if let Some(classes) = &req.classes {
        train.classes = build_class_rows(classes)?;
    }
    if let Some(days) = &req.days {
        train.days = parse_days(days)?;
    }
    if let Some(is_active) = req.is_active {
        train.is_active = is_active;
    }
    train.updated_at = Utc::now();

    let updated = state
        .trains
        .update_train(&train)
        .await
        .map_err(ApiError::internal)?;
    if !updated {
        return Err(ApiError::NotFound("Train not found".to_string()));
    }

    tracing::info!(admin = %claims.sub, train = %train.number, "train updated");
    Ok(Json(TrainResponse::of(&train)))
}

/// DELETE /api/admin/trains/{id}
///
/// Soft delete: the record stays behind its bookings' snapshots.
pub async fn delete_train(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(train_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state
        .trains
        .deactivate_train(train_id)
        .await
        .map_err(ApiError::internal)?;
    if !removed {
        return Err(ApiError::NotFound("Train not found".to_string()));
    }

    tracing::info!(admin = %claims.sub, train_id = %train_id, "train retired");
    Ok(Json(serde_json::json!({ "message": "Train removed" })))
}

// ============================================================================
// Ledger Oversight Handlers
// ============================================================================

/// GET /api/admin/bookings
pub async fn list_all_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = state.reservations.list_all(claims.actor()).await?;
    Ok(Json(bookings.iter().map(BookingResponse::of).collect()))
}
