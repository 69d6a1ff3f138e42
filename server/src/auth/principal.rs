use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use super::claims::{aliases, Claim, ClaimField};

/// Headers injected by App Service Authentication on authenticated requests.
pub const PRINCIPAL_HEADER: &str = "x-ms-client-principal";
pub const PRINCIPAL_ID_HEADER: &str = "x-ms-client-principal-id";
pub const PRINCIPAL_IDP_HEADER: &str = "x-ms-client-principal-idp";
pub const ACCESS_TOKEN_HEADER: &str = "x-ms-token-aad-access-token";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No authenticated session")]
    NoSession,
    #[error("Invalid client principal: {0}")]
    DecodeError(String),
}

/// The signed-in identity for one request.
#[derive(Debug, Clone)]
pub struct ClientPrincipal {
    pub identity_provider: Option<String>,
    pub user_id: Option<String>,
    pub name_claim_type: Option<String>,
    pub role_claim_type: Option<String>,
    pub claims: Vec<Claim>,
    /// Delegated Graph token, present when the platform is configured to
    /// store it for the session.
    pub access_token: Option<String>,
}

impl ClientPrincipal {
    /// Raw claim lookup by claim type, ASCII case-insensitive.
    pub fn find_claim(&self, typ: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|claim| claim.typ.eq_ignore_ascii_case(typ))
            .map(|claim| claim.val.as_str())
    }

    /// First claim matching any accepted spelling of `field`.
    pub fn claim(&self, field: ClaimField) -> Option<&str> {
        aliases(field).iter().find_map(|typ| self.find_claim(typ))
    }

    /// Identifier used as the storage key: the directory object id when
    /// claims carry one, otherwise the platform-assigned user id.
    pub fn stable_id(&self) -> Option<&str> {
        self.claim(ClaimField::UserId).or(self.user_id.as_deref())
    }
}

/// One entry of the `/.auth/me` session payload.
#[derive(Debug, Deserialize)]
struct SessionEntry {
    #[serde(default)]
    provider_name: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    user_claims: Vec<Claim>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Decoded `x-ms-client-principal` header payload.
#[derive(Debug, Deserialize)]
struct PrincipalPayload {
    #[serde(default)]
    auth_typ: Option<String>,
    #[serde(default)]
    claims: Vec<Claim>,
    #[serde(default)]
    name_typ: Option<String>,
    #[serde(default)]
    role_typ: Option<String>,
}

/// Resolves the signed-in user for a request.
///
/// The session endpoint `GET {base}/.auth/me` is authoritative: it is called
/// with the caller's cookie and returns the full claim set plus the stored
/// access token. When the endpoint cannot be reached or reports no session,
/// the injected `x-ms-client-principal` headers are decoded instead.
pub struct EasyAuthClient {
    http_client: Client,
    base_url: Option<String>,
}

impl EasyAuthClient {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
        }
    }

    pub async fn resolve(&self, headers: &HeaderMap) -> Result<ClientPrincipal, AuthError> {
        if let Some(principal) = self.from_session_endpoint(headers).await {
            return Ok(principal);
        }
        self.from_headers(headers)?.ok_or(AuthError::NoSession)
    }

    /// Base URL of the session endpoint. A configured override wins; the
    /// platform front end advertises itself via `x-forwarded-host`. A bare
    /// `Host` header is not enough to locate the endpoint.
    fn resolve_base(&self, headers: &HeaderMap) -> Option<String> {
        if let Some(base) = &self.base_url {
            return Some(base.clone());
        }
        let host = headers.get("x-forwarded-host")?.to_str().ok()?;
        let proto = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("https");
        Some(format!("{}://{}", proto, host))
    }

    async fn from_session_endpoint(&self, headers: &HeaderMap) -> Option<ClientPrincipal> {
        let cookie = headers.get(header::COOKIE)?.to_str().ok()?;
        let base = self.resolve_base(headers)?;
        let url = format!("{}/.auth/me", base.trim_end_matches('/'));

        let response = match self
            .http_client
            .get(&url)
            .header(header::COOKIE, cookie)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Session endpoint unreachable: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(
                status = %response.status().as_u16(),
                "Session endpoint reported no session"
            );
            return None;
        }

        let sessions: Vec<SessionEntry> = match response.json().await {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!("Session endpoint returned malformed payload: {}", e);
                return None;
            }
        };

        let entry = sessions.into_iter().next()?;
        Some(ClientPrincipal {
            identity_provider: entry.provider_name,
            user_id: entry.user_id,
            name_claim_type: None,
            role_claim_type: None,
            claims: entry.user_claims,
            access_token: entry.access_token,
        })
    }

    fn from_headers(&self, headers: &HeaderMap) -> Result<Option<ClientPrincipal>, AuthError> {
        let user_id = header_str(headers, PRINCIPAL_ID_HEADER);
        let provider = header_str(headers, PRINCIPAL_IDP_HEADER);
        let access_token = header_str(headers, ACCESS_TOKEN_HEADER);

        let encoded = match headers.get(PRINCIPAL_HEADER) {
            Some(value) => value
                .to_str()
                .map_err(|_| AuthError::DecodeError("principal header is not ascii".to_string()))?,
            None => {
                // Some front-end configurations inject only the id header.
                return Ok(user_id.map(|user_id| ClientPrincipal {
                    identity_provider: provider,
                    user_id: Some(user_id),
                    name_claim_type: None,
                    role_claim_type: None,
                    claims: Vec::new(),
                    access_token,
                }));
            }
        };

        let decoded = BASE64
            .decode(encoded)
            .map_err(|e| AuthError::DecodeError(format!("invalid base64: {}", e)))?;
        let payload: PrincipalPayload = serde_json::from_slice(&decoded)
            .map_err(|e| AuthError::DecodeError(format!("invalid principal JSON: {}", e)))?;

        Ok(Some(ClientPrincipal {
            identity_provider: provider.or(payload.auth_typ),
            user_id,
            name_claim_type: payload.name_typ,
            role_claim_type: payload.role_typ,
            claims: payload.claims,
            access_token,
        }))
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
