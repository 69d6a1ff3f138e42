//! Best-effort account provisioning.
//!
//! This module provides:
//! - Random initial-password generation within directory complexity rules
//! - Display-name / mail-nickname / principal-name derivation
//! - Same-tenant user creation via `POST /users`
//! - Partner-tenant ("EFSMOD") guest invitations via `POST /invitations`
//!
//! Every flow here runs after the intake row is already persisted; failures
//! are reported to the caller, never rolled back into the mandatory path.

mod create;
mod invite;
pub mod naming;
pub mod password;

pub use create::{AccountCreation, AccountProvisioner};
pub use invite::{EfsmodInvite, EfsmodInviter};

use serde::Serialize;

use crate::graph::{GraphError, TokenError};

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("{0}")]
    Validation(String),
    #[error("Provisioning not configured: {0}")]
    Configuration(String),
    #[error("Identity provider returned {status}: {detail}")]
    Provider { status: u16, detail: String },
    #[error("Identity provider request failed: {0}")]
    Transport(String),
}

impl From<TokenError> for ProvisionError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Transport(s) => ProvisionError::Transport(s),
            TokenError::Rejected { status, detail } => ProvisionError::Provider { status, detail },
            TokenError::Invalid(s) => ProvisionError::Transport(s),
        }
    }
}

impl From<GraphError> for ProvisionError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::Transport(s) => ProvisionError::Transport(s),
            GraphError::Provider { status, detail } => ProvisionError::Provider { status, detail },
            GraphError::InvalidResponse(s) => ProvisionError::Transport(s),
        }
    }
}

/// Result of one best-effort flow: the success payload, or a display
/// string under an `error` key. Serialized straight into the intake
/// response field.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Success(T),
    Failed { error: String },
}

impl<T> From<Result<T, ProvisionError>> for Outcome<T> {
    fn from(result: Result<T, ProvisionError>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e) => Outcome::Failed {
                error: e.to_string(),
            },
        }
    }
}
