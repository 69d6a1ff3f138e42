use serde::Serialize;

use crate::config::{Config, GraphCredentials};
use crate::graph::{DomainCache, GraphClient, NewUser, PasswordProfile, TokenProvider};
use crate::models::IntakeRecord;

use super::{naming, password, ProvisionError};

/// Successful same-tenant creation, returned to the caller for display.
/// The initial password is shown once and never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCreation {
    pub created: bool,
    pub user_id: String,
    pub user_principal_name: String,
    pub initial_password: String,
}

/// Creates a member account in the primary tenant from a persisted intake
/// record.
pub struct AccountProvisioner {
    tokens: TokenProvider,
    graph: GraphClient,
    upn_domain: Option<String>,
}

impl AccountProvisioner {
    pub fn new(config: &Config, credentials: GraphCredentials) -> Self {
        Self {
            tokens: TokenProvider::new(&config.login_base_url, credentials),
            graph: GraphClient::new(&config.graph_base_url),
            upn_domain: config.upn_domain.clone(),
        }
    }

    pub async fn create_user(
        &self,
        intake: &IntakeRecord,
        domains: &DomainCache,
    ) -> Result<AccountCreation, ProvisionError> {
        if intake.email.is_empty() {
            return Err(ProvisionError::Validation(
                "an email is required to create an account".to_string(),
            ));
        }

        let token = self.tokens.get_token().await?;

        let display_name = naming::derive_display_name(intake);
        let nickname = naming::derive_mail_nickname(intake);
        let principal_name = naming::derive_principal_name(
            &intake.email,
            &nickname,
            self.upn_domain.as_deref(),
            || async {
                domains
                    .resolve(|| self.graph.get_verified_domains(&token))
                    .await
                    .map_err(ProvisionError::from)
            },
        )
        .await?;

        let initial_password = password::generate();

        let new_user = NewUser {
            account_enabled: true,
            display_name,
            mail_nickname: nickname,
            user_principal_name: principal_name.clone(),
            password_profile: PasswordProfile {
                password: initial_password.clone(),
                force_change_password_next_sign_in: true,
            },
            given_name: intake.first_name.clone(),
            surname: intake.last_name.clone(),
            mail: Some(intake.email.clone()),
            job_title: intake.job_title.clone(),
            department: intake.department.clone(),
        };

        let created = self.graph.create_user(&token, &new_user).await?;

        tracing::info!(upn = %principal_name, "Provisioned directory account");

        Ok(AccountCreation {
            created: true,
            user_id: created.id,
            user_principal_name: created.user_principal_name.unwrap_or(principal_name),
            initial_password,
        })
    }
}
