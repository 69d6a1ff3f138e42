use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Graph request failed: {0}")]
    Transport(String),
    #[error("Graph returned {status}: {detail}")]
    Provider { status: u16, detail: String },
    #[error("Invalid Graph response: {0}")]
    InvalidResponse(String),
}

/// Directory user as returned by `/me` and `/users/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphUser {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub office_location: Option<String>,
    pub mobile_phone: Option<String>,
    pub business_phones: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedDomain {
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_initial: bool,
}

#[derive(Debug, Deserialize)]
struct OrganizationList {
    value: Vec<Organization>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Organization {
    #[serde(default)]
    verified_domains: Vec<VerifiedDomain>,
}

/// Body for `POST /users`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub account_enabled: bool,
    pub display_name: String,
    pub mail_nickname: String,
    pub user_principal_name: String,
    pub password_profile: PasswordProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordProfile {
    pub password: String,
    pub force_change_password_next_sign_in: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    pub id: String,
    #[serde(default)]
    pub user_principal_name: Option<String>,
}

/// Body for `POST /invitations`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub invited_user_email_address: String,
    pub invite_redirect_url: String,
    pub send_invitation_message: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_user_display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResult {
    #[serde(default)]
    pub invite_redeem_url: Option<String>,
    #[serde(default)]
    pub invited_user: Option<InvitedUser>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InvitedUser {
    pub id: String,
}

/// Thin client over the Graph REST endpoints this service uses. Callers
/// supply the bearer token per call, so one client serves both delegated
/// and app-only requests.
#[derive(Debug)]
pub struct GraphClient {
    http_client: Client,
    base_url: String,
}

impl GraphClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Profile of the signed-in user, via their delegated token.
    pub async fn get_me(&self, access_token: &str) -> Result<GraphUser, GraphError> {
        let url = format!("{}/me", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GraphError::Transport(e.to_string()))?;

        read_json(response).await
    }

    /// Verified domains across all organization objects of the tenant.
    pub async fn get_verified_domains(
        &self,
        access_token: &str,
    ) -> Result<Vec<VerifiedDomain>, GraphError> {
        let url = format!("{}/organization", self.base_url);

        tracing::debug!("Fetching tenant verified domains");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GraphError::Transport(e.to_string()))?;

        let list: OrganizationList = read_json(response).await?;
        Ok(list
            .value
            .into_iter()
            .flat_map(|org| org.verified_domains)
            .collect())
    }

    pub async fn create_user(
        &self,
        access_token: &str,
        user: &NewUser,
    ) -> Result<CreatedUser, GraphError> {
        let url = format!("{}/users", self.base_url);

        tracing::debug!(upn = %user.user_principal_name, "Creating directory user");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .json(user)
            .send()
            .await
            .map_err(|e| GraphError::Transport(e.to_string()))?;

        read_json(response).await
    }

    pub async fn send_invitation(
        &self,
        access_token: &str,
        invitation: &Invitation,
    ) -> Result<InvitationResult, GraphError> {
        let url = format!("{}/invitations", self.base_url);

        tracing::debug!(
            email = %invitation.invited_user_email_address,
            "Creating guest invitation"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .json(invitation)
            .send()
            .await
            .map_err(|e| GraphError::Transport(e.to_string()))?;

        read_json(response).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GraphError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        return Err(GraphError::Provider { status, detail });
    }

    response
        .json()
        .await
        .map_err(|e| GraphError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_serializes_graph_field_names() {
        let user = NewUser {
            account_enabled: true,
            display_name: "Ana Lopez".to_string(),
            mail_nickname: "ana.lopez".to_string(),
            user_principal_name: "ana.lopez@contoso.com".to_string(),
            password_profile: PasswordProfile {
                password: "s3cret".to_string(),
                force_change_password_next_sign_in: true,
            },
            given_name: None,
            surname: None,
            mail: Some("ana@example.com".to_string()),
            job_title: None,
            department: None,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["accountEnabled"], true);
        assert_eq!(value["userPrincipalName"], "ana.lopez@contoso.com");
        assert_eq!(
            value["passwordProfile"]["forceChangePasswordNextSignIn"],
            true
        );
        // Omitted optionals must not appear at all.
        assert!(value.get("givenName").is_none());
    }

    #[test]
    fn test_graph_user_parses_me_payload() {
        let user: GraphUser = serde_json::from_value(serde_json::json!({
            "id": "u-1",
            "displayName": "Ana Lopez",
            "mail": "ana@example.com",
            "businessPhones": ["+1 555 0100"],
            "officeLocation": null
        }))
        .unwrap();

        assert_eq!(user.display_name.as_deref(), Some("Ana Lopez"));
        assert_eq!(user.business_phones, vec!["+1 555 0100".to_string()]);
        assert!(user.office_location.is_none());
        assert!(user.job_title.is_none());
    }

    #[test]
    fn test_invitation_serializes_graph_field_names() {
        let invitation = Invitation {
            invited_user_email_address: "ana@example.com".to_string(),
            invite_redirect_url: "https://portal.example.com/".to_string(),
            send_invitation_message: false,
            invited_user_display_name: Some("Ana Lopez".to_string()),
        };

        let value = serde_json::to_value(&invitation).unwrap();
        assert_eq!(value["invitedUserEmailAddress"], "ana@example.com");
        assert_eq!(value["sendInvitationMessage"], false);
    }
}
