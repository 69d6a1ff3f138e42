use std::env;

/// Recognized spellings per setting; first set variable wins. Several of
/// these accumulated alias names across ARM templates and older pipelines,
/// so lookup is alias-aware rather than single-name.
const ENVIRONMENT_VARS: &[&str] = &["APP_ENV", "NODE_ENV"];
const AZ_TENANT_ID_VARS: &[&str] = &["AZ_TENANT_ID", "AZURE_TENANT_ID", "AZURE_AD_TENANT_ID"];
const AZ_CLIENT_ID_VARS: &[&str] = &["AZ_CLIENT_ID", "AZURE_CLIENT_ID", "AZURE_AD_CLIENT_ID"];
const AZ_CLIENT_SECRET_VARS: &[&str] = &[
    "AZ_CLIENT_SECRET",
    "AZURE_CLIENT_SECRET",
    "AZURE_AD_CLIENT_SECRET",
];
const SQL_CONNECTION_STRING_VARS: &[&str] = &["SQL_CONNECTION_STRING", "DATABASE_URL"];

/// Default Microsoft endpoints; overridable so tests can point the
/// system at a local stub.
const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
const DEFAULT_LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";

/// Application configuration loaded from environment variables.
///
/// Only an unparseable `PORT` aborts startup. Anything else that is
/// missing becomes a configuration error raised by the component that
/// first needs it, so a partially configured deployment can still serve
/// its static and status surface.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 8080)
    pub port: u16,
    /// Deployment environment name; "development" exposes error detail.
    pub environment: String,
    /// Explicit store connection string (`sqlite:` prefix tolerated).
    pub sql_connection_string: Option<String>,
    /// Server/database pair a store path is derived from when no
    /// connection string is given.
    pub sql_server: Option<String>,
    pub sql_database: Option<String>,
    /// Primary-tenant Graph credentials (same-tenant user creation).
    pub primary: TenantCredentials,
    /// Override for the domain suffix of generated principal names.
    pub upn_domain: Option<String>,
    /// Secondary-tenant credentials (EFSMOD cross-tenant invitations).
    pub efsmod: TenantCredentials,
    /// Where invited EFSMOD users land after redeeming.
    pub efsmod_base_url: Option<String>,
    pub efsmod_redirect_path: String,
    /// Platform auth endpoint base; derived from request headers when unset.
    pub easyauth_base_url: Option<String>,
    /// Microsoft Graph API base URL.
    pub graph_base_url: String,
    /// Identity-provider login base URL.
    pub login_base_url: String,
    /// Log level (default: info)
    pub log_level: String,
}

/// Client-credential material for one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Resolution state of one tenant's credential triple.
///
/// `Absent` means the flow is simply not configured and is skipped;
/// `Partial` means someone set part of the triple, which is reported as
/// a configuration error when the flow is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantCredentials {
    Absent,
    Partial { missing: &'static str },
    Ready(GraphCredentials),
}

impl TenantCredentials {
    fn from_parts(
        tenant_id: (Option<String>, &'static str),
        client_id: (Option<String>, &'static str),
        client_secret: (Option<String>, &'static str),
    ) -> Self {
        match (tenant_id, client_id, client_secret) {
            ((None, _), (None, _), (None, _)) => TenantCredentials::Absent,
            ((Some(tenant_id), _), (Some(client_id), _), (Some(client_secret), _)) => {
                TenantCredentials::Ready(GraphCredentials {
                    tenant_id,
                    client_id,
                    client_secret,
                })
            }
            ((None, missing), _, _) | (_, (None, missing), _) | (_, _, (None, missing)) => {
                TenantCredentials::Partial { missing }
            }
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            environment: env_any(ENVIRONMENT_VARS).unwrap_or_else(|| "production".to_string()),
            sql_connection_string: env_any(SQL_CONNECTION_STRING_VARS),
            sql_server: env_opt("SQL_SERVER"),
            sql_database: env_opt("SQL_DATABASE"),
            primary: TenantCredentials::from_parts(
                (env_any(AZ_TENANT_ID_VARS), "AZ_TENANT_ID"),
                (env_any(AZ_CLIENT_ID_VARS), "AZ_CLIENT_ID"),
                (env_any(AZ_CLIENT_SECRET_VARS), "AZ_CLIENT_SECRET"),
            ),
            upn_domain: env_opt("UPN_DOMAIN"),
            efsmod: TenantCredentials::from_parts(
                (env_opt("EFSMOD_TENANT_ID"), "EFSMOD_TENANT_ID"),
                (env_opt("EFSMOD_CLIENT_ID"), "EFSMOD_CLIENT_ID"),
                (env_opt("EFSMOD_CLIENT_SECRET"), "EFSMOD_CLIENT_SECRET"),
            ),
            efsmod_base_url: env_opt("EFSMOD_BASE_URL"),
            efsmod_redirect_path: env_opt("EFSMOD_REDIRECT_PATH")
                .unwrap_or_else(|| "/".to_string()),
            easyauth_base_url: env_opt("EASYAUTH_BASE_URL"),
            graph_base_url: env_opt("GRAPH_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string()),
            login_base_url: env_opt("LOGIN_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LOGIN_BASE_URL.to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Whether internal error detail may be exposed to callers.
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_any(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| env_opt(name))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_credentials_absent_when_nothing_set() {
        let creds = TenantCredentials::from_parts(
            (None, "AZ_TENANT_ID"),
            (None, "AZ_CLIENT_ID"),
            (None, "AZ_CLIENT_SECRET"),
        );
        assert_eq!(creds, TenantCredentials::Absent);
    }

    #[test]
    fn test_credentials_partial_reports_first_missing_name() {
        let creds = TenantCredentials::from_parts(
            (some("tenant"), "AZ_TENANT_ID"),
            (None, "AZ_CLIENT_ID"),
            (None, "AZ_CLIENT_SECRET"),
        );
        assert_eq!(
            creds,
            TenantCredentials::Partial {
                missing: "AZ_CLIENT_ID"
            }
        );
    }

    #[test]
    fn test_credentials_ready_when_all_present() {
        let creds = TenantCredentials::from_parts(
            (some("tenant"), "AZ_TENANT_ID"),
            (some("client"), "AZ_CLIENT_ID"),
            (some("secret"), "AZ_CLIENT_SECRET"),
        );
        match creds {
            TenantCredentials::Ready(creds) => {
                assert_eq!(creds.tenant_id, "tenant");
                assert_eq!(creds.client_id, "client");
                assert_eq!(creds.client_secret, "secret");
            }
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[test]
    fn test_secret_only_is_partial_not_absent() {
        let creds = TenantCredentials::from_parts(
            (None, "EFSMOD_TENANT_ID"),
            (None, "EFSMOD_CLIENT_ID"),
            (some("secret"), "EFSMOD_CLIENT_SECRET"),
        );
        assert_eq!(
            creds,
            TenantCredentials::Partial {
                missing: "EFSMOD_TENANT_ID"
            }
        );
    }
}
