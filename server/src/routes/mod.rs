//! HTTP surface.
//!
//! This module provides:
//! - Static page serving and sign-in/out redirects
//! - Liveness and status endpoints
//! - The authentication, profile, and intake APIs
//! - A JSON 404 fallback for everything else

pub mod auth;
pub mod health;
pub mod intake;
pub mod pages;
pub mod profile;

use std::sync::Arc;

use axum::http::{HeaderMap, Uri};
use axum::Router;

use crate::auth::{AuthError, ClientPrincipal};
use crate::error::ApiError;
use crate::AppState;

/// Compose every route group plus the JSON 404 fallback.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(pages::router())
        .merge(health::router(state.clone()))
        .merge(auth::router(state.clone()))
        .merge(profile::router(state.clone()))
        .merge(intake::router(state))
        .fallback(not_found)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

/// Resolve the signed-in principal or map the failure onto the API error
/// taxonomy: no session is the caller's problem, a malformed principal is
/// ours.
pub(crate) async fn require_principal(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<ClientPrincipal, ApiError> {
    state.easy_auth.resolve(headers).await.map_err(|e| match e {
        AuthError::NoSession => {
            ApiError::Unauthenticated("Sign in to continue".to_string())
        }
        AuthError::DecodeError(detail) => {
            state.internal_error(format!("Failed to decode client principal: {}", detail))
        }
    })
}
