use reqwest::Client;
use serde::Deserialize;

use crate::config::GraphCredentials;

/// Scope for application-permission Graph calls.
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token request failed: {0}")]
    Transport(String),
    #[error("Token rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("Invalid token response: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Acquires app-only Graph tokens via the client-credentials grant.
///
/// Tokens are not cached: provisioning happens at most once per form
/// submission, so each attempt performs its own grant.
#[derive(Debug)]
pub struct TokenProvider {
    http_client: Client,
    login_base_url: String,
    credentials: GraphCredentials,
}

impl TokenProvider {
    pub fn new(login_base_url: &str, credentials: GraphCredentials) -> Self {
        Self {
            http_client: Client::new(),
            login_base_url: login_base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base_url, self.credentials.tenant_id
        )
    }

    pub async fn get_token(&self) -> Result<String, TokenError> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", GRAPH_DEFAULT_SCOPE),
            ("grant_type", "client_credentials"),
        ];

        tracing::debug!(tenant = %self.credentials.tenant_id, "Requesting Graph token");

        let response = self
            .http_client
            .post(self.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| TokenError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(TokenError::Rejected { status, detail });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        Ok(token.access_token)
    }
}
