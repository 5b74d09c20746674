//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST /registration - Register a new user
//! - POST /login - Login and get tokens
//! - POST /logout - Revoke the presented refresh token
//! - POST /token_refresh - Issue a new access token
//! - GET /allusers - List all registered users
//! - GET /logged_user - Get the current user's record

use axum::{
    Json, Router,
    extract::State,
    extract::rejection::JsonRejection,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::service::{AuthError, AuthResponse, AuthService, LoginRequest, RegisterRequest};
use crate::db::models::UserResponse;

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
}

/// API error response body
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error_message: String,
}

impl ApiError {
    pub fn new(error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
        }
    }
}

/// Convert AuthError to an API response.
///
/// Token failures all collapse to a generic 401 body; the specific kind only
/// reaches the log.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AuthError::Validation(_)
            | AuthError::MissingCredentials(_)
            | AuthError::DuplicateUser
            | AuthError::UserNotFound
            | AuthError::InvalidCredentials => (StatusCode::BAD_REQUEST, self.to_string()),
            AuthError::TokenExpired
            | AuthError::TokenMalformed
            | AuthError::TokenRevoked
            | AuthError::TokenSignatureInvalid => {
                tracing::debug!("rejected token: {}", self);
                (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
            }
            AuthError::InternalError(_) => {
                tracing::error!("request failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        (status, Json(ApiError::new(body))).into_response()
    }
}

/// Response for logout
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Response for token refresh
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/registration", post(registration_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/token_refresh", post(token_refresh_handler))
        .route("/allusers", get(allusers_handler))
        .route("/logged_user", get(logged_user_handler))
        .with_state(state)
}

/// POST /registration
/// Register a new user
async fn registration_handler(
    State(state): State<Arc<AuthApiState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let Json(request) = payload.map_err(bad_payload)?;

    tracing::info!(
        "Registration attempt for username: {}",
        request.username.as_deref().unwrap_or("<missing>")
    );

    let response = state.auth_service.register(request).await?;

    Ok(Json(response))
}

/// POST /login
/// Login and get access/refresh tokens
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let Json(request) = payload.map_err(bad_payload)?;

    tracing::info!(
        "Login attempt for username: {}",
        request.username.as_deref().unwrap_or("<missing>")
    );

    let response = state.auth_service.login(request).await?;

    Ok(Json(response))
}

/// POST /logout
/// Revoke the refresh token carried in the Authorization header
async fn logout_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, AuthError> {
    let token = extract_bearer_token(&headers)?;

    state.auth_service.logout(&token).await?;

    Ok(Json(LogoutResponse {
        message: "Refresh token has been revoked".to_string(),
    }))
}

/// POST /token_refresh
/// Issue a new access token against the refresh token in the Authorization header
async fn token_refresh_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, AuthError> {
    let token = extract_bearer_token(&headers)?;

    let access_token = state.auth_service.refresh(&token).await?;

    Ok(Json(RefreshResponse { access_token }))
}

/// GET /allusers
/// List all registered users (password hashes excluded)
async fn allusers_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserResponse>>, AuthError> {
    let token = extract_bearer_token(&headers)?;

    let users = state.auth_service.list_users(&token).await?;

    Ok(Json(users))
}

/// GET /logged_user
/// Get the user record behind the presented access token
async fn logged_user_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, AuthError> {
    let token = extract_bearer_token(&headers)?;

    let user = state.auth_service.current_user(&token).await?;

    Ok(Json(user))
}

/// Map an unreadable JSON body to a validation error
fn bad_payload(rejection: JsonRejection) -> AuthError {
    AuthError::Validation(rejection.body_text())
}

/// Extract Bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::TokenMalformed)?;

    if !auth_header.starts_with("Bearer ") {
        return Err(AuthError::TokenMalformed);
    }

    let token = auth_header.trim_start_matches("Bearer ").to_string();

    if token.is_empty() {
        return Err(AuthError::TokenMalformed);
    }

    Ok(token)
}
