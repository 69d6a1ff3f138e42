use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use crate::auth::ClaimField;
use crate::config::TenantCredentials;
use crate::error::ApiError;
use crate::models::{IntakeRecord, IntakeSubmission};
use crate::provision::{AccountCreation, AccountProvisioner, EfsmodInvite, EfsmodInviter, Outcome};
use crate::routes::require_principal;
use crate::AppState;

#[derive(Serialize)]
struct IntakeResponse {
    message: &'static str,
    intake: IntakeRecord,
    #[serde(rename = "accountCreation", skip_serializing_if = "Option::is_none")]
    account_creation: Option<Outcome<AccountCreation>>,
    #[serde(rename = "efsmodeInvite", skip_serializing_if = "Option::is_none")]
    efsmode_invite: Option<Outcome<EfsmodInvite>>,
}

/// Two-phase submission: persisting the form is mandatory and any failure
/// ends the request; provisioning afterwards is best-effort and reports
/// its failures inside the 200 body.
async fn submit_intake(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(submission): Json<IntakeSubmission>,
) -> Result<Json<IntakeResponse>, ApiError> {
    let principal = require_principal(&state, &headers).await?;
    let user_id = principal
        .stable_id()
        .ok_or_else(|| {
            ApiError::Unauthenticated("Session carries no user identifier".to_string())
        })?
        .to_string();

    let form = submission.sanitized();
    let email = form
        .email
        .clone()
        .or_else(|| principal.claim(ClaimField::Email).map(String::from))
        .ok_or_else(|| {
            ApiError::Validation(
                "An email address is required, either in the form or on your account".to_string(),
            )
        })?;

    let record = state
        .store
        .upsert(&user_id, &email, &form)
        .map_err(|e| state.internal_error(format!("Failed to save intake form: {}", e)))?;

    let account_creation = provision_account(&state, &record).await;
    let efsmode_invite = provision_invite(&state, &record).await;

    Ok(Json(IntakeResponse {
        message: "Intake form saved",
        intake: record,
        account_creation,
        efsmode_invite,
    }))
}

async fn provision_account(
    state: &AppState,
    record: &IntakeRecord,
) -> Option<Outcome<AccountCreation>> {
    match &state.config.primary {
        TenantCredentials::Absent => {
            tracing::debug!("Primary tenant credentials not configured; skipping account creation");
            None
        }
        TenantCredentials::Partial { missing } => Some(Outcome::Failed {
            error: format!("Account creation unavailable: {} is not set", missing),
        }),
        TenantCredentials::Ready(credentials) => {
            let provisioner = AccountProvisioner::new(&state.config, credentials.clone());
            let result = provisioner.create_user(record, &state.domain_cache).await;
            if let Err(e) = &result {
                tracing::warn!(user_id = %record.user_id, "Account creation failed: {}", e);
            }
            Some(result.into())
        }
    }
}

async fn provision_invite(
    state: &AppState,
    record: &IntakeRecord,
) -> Option<Outcome<EfsmodInvite>> {
    match &state.config.efsmod {
        TenantCredentials::Absent => {
            tracing::debug!("EFSMOD credentials not configured; skipping invitation");
            None
        }
        TenantCredentials::Partial { missing } => Some(Outcome::Failed {
            error: format!("EFSMOD invitation unavailable: {} is not set", missing),
        }),
        TenantCredentials::Ready(credentials) => {
            let result = match EfsmodInviter::new(&state.config, credentials.clone()) {
                Ok(inviter) => inviter.invite(record).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                tracing::warn!(user_id = %record.user_id, "EFSMOD invitation failed: {}", e);
            }
            Some(result.into())
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/intake", post(submit_intake))
        .with_state(state)
}
