use serde::Serialize;
use url::Url;

use crate::config::{Config, GraphCredentials};
use crate::graph::{GraphClient, Invitation, TokenProvider};
use crate::models::IntakeRecord;

use super::{naming, ProvisionError};

/// Successful partner-tenant invitation. `deep_link` is what the portal
/// shows the user: the provider redeem URL when one came back, else the
/// front-channel login link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EfsmodInvite {
    pub invited: bool,
    pub invited_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_redeem_url: Option<String>,
    pub deep_link: String,
    pub login_link: String,
}

/// Invites the intake email into the EFSMOD tenant as a guest.
#[derive(Debug)]
pub struct EfsmodInviter {
    tokens: TokenProvider,
    graph: GraphClient,
    login_base_url: String,
    tenant_id: String,
    client_id: String,
    base_url: String,
    redirect_path: String,
}

impl EfsmodInviter {
    pub fn new(config: &Config, credentials: GraphCredentials) -> Result<Self, ProvisionError> {
        let base_url = config.efsmod_base_url.clone().ok_or_else(|| {
            ProvisionError::Configuration("EFSMOD_BASE_URL is not set".to_string())
        })?;

        Ok(Self {
            tokens: TokenProvider::new(&config.login_base_url, credentials.clone()),
            graph: GraphClient::new(&config.graph_base_url),
            login_base_url: config.login_base_url.trim_end_matches('/').to_string(),
            tenant_id: credentials.tenant_id,
            client_id: credentials.client_id,
            base_url,
            redirect_path: config.efsmod_redirect_path.clone(),
        })
    }

    pub async fn invite(&self, intake: &IntakeRecord) -> Result<EfsmodInvite, ProvisionError> {
        if !intake.email.contains('@') {
            return Err(ProvisionError::Validation(
                "a valid email is required to send an invitation".to_string(),
            ));
        }

        let token = self.tokens.get_token().await?;
        let redirect_url = join_redirect(&self.base_url, &self.redirect_path);

        let invitation = Invitation {
            invited_user_email_address: intake.email.clone(),
            invite_redirect_url: redirect_url.clone(),
            send_invitation_message: false,
            invited_user_display_name: Some(naming::derive_display_name(intake)),
        };

        let result = self.graph.send_invitation(&token, &invitation).await?;

        let login_link = self.login_link(&intake.email, &redirect_url)?;
        let deep_link = result
            .invite_redeem_url
            .clone()
            .unwrap_or_else(|| login_link.clone());

        tracing::info!(email = %intake.email, "Created EFSMOD invitation");

        Ok(EfsmodInvite {
            invited: true,
            invited_email: intake.email.clone(),
            invited_user_id: result.invited_user.map(|u| u.id),
            invite_redeem_url: result.invite_redeem_url,
            deep_link,
            login_link,
        })
    }

    /// Authorize URL the portal can hand to the user directly, prefilled
    /// with their email.
    fn login_link(&self, email: &str, redirect_url: &str) -> Result<String, ProvisionError> {
        let mut url = Url::parse(&format!(
            "{}/{}/oauth2/v2.0/authorize",
            self.login_base_url, self.tenant_id
        ))
        .map_err(|e| ProvisionError::Configuration(format!("invalid login URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", redirect_url)
            .append_pair("scope", "openid profile")
            .append_pair("login_hint", email);

        Ok(url.to_string())
    }
}

fn join_redirect(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
