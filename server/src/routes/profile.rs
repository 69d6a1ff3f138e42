use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

use crate::auth::Claim;
use crate::error::ApiError;
use crate::graph::GraphUser;
use crate::profile::{build_profile, Profile};
use crate::routes::require_principal;
use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    profile: Profile,
    auth_provider: Option<String>,
    claims: Vec<Claim>,
    /// Raw Graph `/me` object when the overlay succeeded, else null.
    graph: Option<GraphUser>,
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    let principal = require_principal(&state, &headers).await?;

    // The Graph overlay needs the delegated token the platform stored for
    // the session; without one the claims are all we have.
    let graph = match principal.access_token.as_deref() {
        Some(token) => match state.graph.get_me(token).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Graph profile fetch failed, serving claims only: {}", e);
                None
            }
        },
        None => None,
    };

    let profile = build_profile(&principal, graph.as_ref());

    Ok(Json(ProfileResponse {
        profile,
        auth_provider: principal.identity_provider.clone(),
        claims: principal.claims,
        graph,
    }))
}

/// Legacy endpoint kept for old clients; profile data lives in the
/// directory and is not writable here.
async fn update_profile() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Profile fields are managed by your identity provider; nothing was changed."
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/profile", get(get_profile).post(update_profile))
        .with_state(state)
}
