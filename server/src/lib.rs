pub mod auth;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod models;
pub mod profile;
pub mod provision;
pub mod routes;
pub mod store;
pub mod test_util;

pub use auth::{Claim, ClaimField, ClientPrincipal, EasyAuthClient};
pub use config::{Config, GraphCredentials, TenantCredentials};
pub use error::ApiError;
pub use graph::{DomainCache, GraphClient};
pub use models::{IntakeRecord, IntakeSubmission};
pub use profile::{build_profile, Profile};
pub use provision::{AccountCreation, AccountProvisioner, EfsmodInvite, EfsmodInviter, Outcome, ProvisionError};
pub use store::{IntakeStore, StoreError};

use std::time::Instant;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub easy_auth: EasyAuthClient,
    pub graph: GraphClient,
    pub store: IntakeStore,
    /// Memoized tenant verified domain, shared across submissions.
    pub domain_cache: DomainCache,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let easy_auth = EasyAuthClient::new(config.easyauth_base_url.clone());
        let graph = GraphClient::new(&config.graph_base_url);
        let store = IntakeStore::from_config(&config);

        Self {
            config,
            easy_auth,
            graph,
            store,
            domain_cache: DomainCache::new(),
            started_at: Instant::now(),
        }
    }

    /// Log an internal failure and build its 500 response. The caller sees
    /// the underlying message only in development.
    pub fn internal_error(&self, message: impl Into<String>) -> ApiError {
        let message = message.into();
        tracing::error!("{}", message);
        ApiError::internal(message, self.config.is_development())
    }
}
