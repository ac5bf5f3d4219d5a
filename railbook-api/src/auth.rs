use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use railbook_core::identity::{ProfileUpdate, User};
use railbook_core::pii::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::{auth_middleware, Claims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Masked<String>,
    pub phone: Option<Masked<String>>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

impl UserResponse {
    fn of(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            state: user.state.clone(),
            district: user.district.clone(),
            is_admin: user.is_admin,
        }
    }
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user.id,
        name: user.name.clone(),
        is_admin: user.is_admin,
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("Token encoding failed: {e}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Name and email are required".to_string(),
        ));
    }

    let existing = state
        .users
        .find_by_email(&req.email)
        .await
        .map_err(ApiError::internal)?;
    if existing.is_some() {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let mut user = User::new(req.name, req.email);
    user.phone = req.phone.map(Masked);
    user.state = req.state;
    user.district = req.district;

    state
        .users
        .create_user(&user)
        .await
        .map_err(ApiError::internal)?;

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse {
        user: UserResponse::of(&user),
        token,
    }))
}

/// POST /api/auth/login
///
/// Credential verification is delegated to an upstream identity provider;
/// this endpoint exchanges a registered email for a session token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .users
        .find_by_email(&req.email)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::BadRequest("Invalid credentials".to_string()))?;

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse {
        user: UserResponse::of(&user),
        token,
    }))
}

/// GET /api/auth/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .get_user(claims.sub)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(UserResponse::of(&user)))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .update_profile(claims.sub, &update)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(UserResponse::of(&user)))
}
