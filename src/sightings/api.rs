//! Sightings API endpoints
//!
//! - POST /sight - Submit a species observation
//! - GET /sights - List recent observations
//!
//! Submission works without a token (citizen contributions stay
//! low-friction), but a presented token must be valid and stamps the
//! sighting with the observer's username.

use axum::{
    Json, Router,
    extract::State,
    extract::rejection::JsonRejection,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;

use crate::auth::api::extract_bearer_token;
use crate::auth::service::{AuthError, AuthService};
use crate::db::models::{CreateSighting, Sighting};
use crate::db::repositories::{SightingRepository, SightingRepositoryError};

/// How many sightings the listing returns at most
const RECENT_SIGHTINGS_LIMIT: i64 = 100;

/// Sightings API state
#[derive(Clone)]
pub struct SightingsApiState {
    pub sighting_repo: SightingRepository,
    pub auth_service: AuthService,
}

/// Sighting submission error types
#[derive(Debug, thiserror::Error)]
pub enum SightingError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<SightingRepositoryError> for SightingError {
    fn from(err: SightingRepositoryError) -> Self {
        SightingError::InternalError(err.to_string())
    }
}

impl IntoResponse for SightingError {
    fn into_response(self) -> Response {
        match self {
            SightingError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(crate::auth::api::ApiError::new(message)),
            )
                .into_response(),
            SightingError::Auth(err) => err.into_response(),
            SightingError::InternalError(message) => {
                tracing::error!("sighting request failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(crate::auth::api::ApiError::new(message)),
                )
                    .into_response()
            }
        }
    }
}

/// Check a sighting payload against the accepted shape
fn validate_sighting(dto: &CreateSighting) -> Result<(), SightingError> {
    if dto.species.trim().is_empty() {
        return Err(SightingError::Validation(
            "species must not be empty".to_string(),
        ));
    }

    if dto.count < 1 {
        return Err(SightingError::Validation(
            "count must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Create the sightings API router
pub fn sightings_router(state: SightingsApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/sight", post(submit_handler))
        .route("/sights", get(list_handler))
        .with_state(state)
}

/// POST /sight
/// Validate and persist a single observation
async fn submit_handler(
    State(state): State<Arc<SightingsApiState>>,
    headers: HeaderMap,
    payload: Result<Json<CreateSighting>, JsonRejection>,
) -> Result<(StatusCode, Json<Sighting>), SightingError> {
    let Json(dto) = payload.map_err(|r| SightingError::Validation(r.body_text()))?;

    validate_sighting(&dto)?;

    // No token means an anonymous submission; a token that is present but
    // invalid is rejected rather than silently dropped.
    let observer = match headers.get(header::AUTHORIZATION) {
        Some(_) => {
            let token = extract_bearer_token(&headers)?;
            let claims = state.auth_service.verify_access_token(&token).await?;
            Some(claims.sub)
        }
        None => None,
    };

    tracing::info!(
        "Sighting submitted: {} by {}",
        dto.species,
        observer.as_deref().unwrap_or("anonymous")
    );

    let sighting = state.sighting_repo.create(&dto, observer.as_deref()).await?;

    Ok((StatusCode::CREATED, Json(sighting)))
}

/// GET /sights
/// List recent observations, newest first
async fn list_handler(
    State(state): State<Arc<SightingsApiState>>,
) -> Result<Json<Vec<Sighting>>, SightingError> {
    let sightings = state.sighting_repo.list_recent(RECENT_SIGHTINGS_LIMIT).await?;

    Ok(Json(sightings))
}
