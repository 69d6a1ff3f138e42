use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::auth::{AuthError, ClaimField, ClientPrincipal};
use crate::error::ApiError;
use crate::AppState;

#[derive(Serialize)]
struct AuthStatusResponse {
    authenticated: bool,
    user: Option<UserSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserSummary {
    user_id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    provider: Option<String>,
}

/// Lightweight check the pages poll to render the signed-in header. An
/// anonymous caller gets a regular 200 with `authenticated: false`.
async fn auth_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AuthStatusResponse>, ApiError> {
    match state.easy_auth.resolve(&headers).await {
        Ok(principal) => Ok(Json(AuthStatusResponse {
            authenticated: true,
            user: Some(summarize(&principal)),
        })),
        Err(AuthError::NoSession) => Ok(Json(AuthStatusResponse {
            authenticated: false,
            user: None,
        })),
        Err(AuthError::DecodeError(detail)) => Err(state.internal_error(format!(
            "Failed to decode client principal: {}",
            detail
        ))),
    }
}

fn summarize(principal: &ClientPrincipal) -> UserSummary {
    UserSummary {
        user_id: principal.stable_id().map(String::from),
        name: principal.claim(ClaimField::Name).map(String::from),
        email: principal.claim(ClaimField::Email).map(String::from),
        provider: principal.identity_provider.clone(),
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/auth/status", get(auth_status))
        .route("/api/auth/me", get(auth_status))
        .with_state(state)
}
