use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use railbook_booking::ReservationError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    /// For storage and other faults the caller can do nothing about. The
    /// detail goes to the log, not over the wire.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<ReservationError> for ApiError {
    fn from(err: ReservationError) -> Self {
        match &err {
            ReservationError::TrainNotFound | ReservationError::BookingNotFound => {
                ApiError::NotFound(err.to_string())
            }
            ReservationError::UnknownClass(_) | ReservationError::InvalidPassengers(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ReservationError::CapacityExceeded { .. } => ApiError::Conflict(err.to_string()),
            ReservationError::AlreadyCancelled => ApiError::Conflict(err.to_string()),
            ReservationError::Forbidden => ApiError::Forbidden(err.to_string()),
            ReservationError::PnrExhausted | ReservationError::Storage(_) => {
                ApiError::Unavailable(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unavailable(msg) => {
                tracing::error!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_errors_map_to_spec_statuses() {
        let cases: Vec<(ReservationError, StatusCode)> = vec![
            (ReservationError::TrainNotFound, StatusCode::NOT_FOUND),
            (ReservationError::BookingNotFound, StatusCode::NOT_FOUND),
            (
                ReservationError::UnknownClass("4AC".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ReservationError::InvalidPassengers("empty".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ReservationError::CapacityExceeded {
                    requested: 2,
                    available: 1,
                },
                StatusCode::CONFLICT,
            ),
            (ReservationError::AlreadyCancelled, StatusCode::CONFLICT),
            (ReservationError::Forbidden, StatusCode::FORBIDDEN),
            (ReservationError::PnrExhausted, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
