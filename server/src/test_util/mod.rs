//! Shared helpers for unit and integration tests.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;

use crate::config::{Config, TenantCredentials};
use crate::AppState;

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 8080,
        environment: "test".to_string(),
        sql_connection_string: Some("sqlite::memory:".to_string()),
        sql_server: None,
        sql_database: None,
        primary: TenantCredentials::Absent,
        upn_domain: None,
        efsmod: TenantCredentials::Absent,
        efsmod_base_url: None,
        efsmod_redirect_path: "/".to_string(),
        easyauth_base_url: None,
        graph_base_url: "https://graph.microsoft.com/v1.0".to_string(),
        login_base_url: "https://login.microsoftonline.com".to_string(),
        log_level: "debug".to_string(),
    }
}

pub fn create_test_state() -> Arc<AppState> {
    Arc::new(AppState::new(test_config()))
}

/// Base64 `x-ms-client-principal` value carrying the given claims, shaped
/// the way the platform injects it.
pub fn encode_principal(provider: &str, claims: &[(&str, &str)]) -> String {
    let payload = json!({
        "auth_typ": provider,
        "claims": claims
            .iter()
            .map(|(typ, val)| json!({ "typ": typ, "val": val }))
            .collect::<Vec<_>>(),
        "name_typ": "name",
        "role_typ": "roles",
    });
    BASE64.encode(payload.to_string())
}
