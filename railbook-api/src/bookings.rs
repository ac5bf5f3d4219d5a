use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use railbook_booking::models::{Booking, BookingStatus, Passenger, PaymentStatus, TrainSnapshot};
use railbook_catalog::TravelClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::{auth_middleware, Claims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub train_id: Uuid,
    pub class: TravelClass,
    pub journey_date: NaiveDate,
    pub passengers: Vec<Passenger>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub train: TrainSnapshot,
    pub journey_date: NaiveDate,
    pub passengers: Vec<Passenger>,
    pub class: TravelClass,
    pub total_fare: i64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub pnr: String,
    pub booked_at: chrono::DateTime<chrono::Utc>,
}

impl BookingResponse {
    pub fn of(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            user_id: booking.user_id,
            train: booking.train.clone(),
            journey_date: booking.journey_date,
            passengers: booking.passengers.clone(),
            class: booking.class,
            total_fare: booking.total_fare,
            status: booking.status,
            payment_status: booking.payment_status,
            pnr: booking.pnr.clone(),
            booked_at: booking.booked_at,
        }
    }
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_booking))
        .route("/my-bookings", get(my_bookings))
        .route("/{id}", get(get_booking))
        .route("/{id}/cancel", put(cancel_booking))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    // PNR status lookup stays anonymous: holding the PNR string is the
    // only credential, as at a station enquiry counter.
    Router::new()
        .route("/pnr/{pnr}", get(lookup_by_pnr))
        .merge(protected)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state
        .reservations
        .reserve(
            claims.sub,
            req.train_id,
            req.class,
            req.journey_date,
            req.passengers,
        )
        .await?;
    Ok(Json(BookingResponse::of(&booking)))
}

/// GET /api/bookings/my-bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = state.reservations.list_by_owner(claims.sub).await?;
    Ok(Json(bookings.iter().map(BookingResponse::of).collect()))
}

/// GET /api/bookings/pnr/{pnr}
pub async fn lookup_by_pnr(
    State(state): State<AppState>,
    Path(pnr): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state
        .reservations
        .lookup_by_pnr(&pnr)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;
    Ok(Json(BookingResponse::of(&booking)))
}

/// GET /api/bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state
        .reservations
        .get_booking(booking_id, claims.actor())
        .await?;
    Ok(Json(BookingResponse::of(&booking)))
}

/// PUT /api/bookings/{id}/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state
        .reservations
        .release(booking_id, claims.actor())
        .await?;
    Ok(Json(BookingResponse::of(&booking)))
}
