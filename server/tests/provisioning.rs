use chrono::Utc;
use flwins_server::config::GraphCredentials;
use flwins_server::graph::{DomainCache, TokenError, TokenProvider};
use flwins_server::models::IntakeRecord;
use flwins_server::provision::{AccountProvisioner, EfsmodInviter, ProvisionError};
use flwins_server::test_util::test_config;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials(tenant: &str) -> GraphCredentials {
    GraphCredentials {
        tenant_id: tenant.to_string(),
        client_id: "client-1".to_string(),
        client_secret: "secret-1".to_string(),
    }
}

fn intake_record(email: &str) -> IntakeRecord {
    IntakeRecord {
        id: "r-1".to_string(),
        user_id: "user-1".to_string(),
        email: email.to_string(),
        first_name: Some("Ana".to_string()),
        last_name: Some("Lopez".to_string()),
        display_name: None,
        job_title: Some("Case Worker".to_string()),
        department: None,
        office_location: None,
        address_line1: None,
        address_line2: None,
        city: None,
        state_region: None,
        postal_code: None,
        phone: None,
        mobile_phone: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn mount_token(mock_server: &MockServer, tenant: &str, token: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/v2.0/token", tenant)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": token
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_token_grant_posts_client_credentials_form() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contoso/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-1"))
        .and(body_string_contains(
            "scope=https%3A%2F%2Fgraph.microsoft.com%2F.default",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "token-1"
        })))
        .mount(&mock_server)
        .await;

    let provider = TokenProvider::new(&mock_server.uri(), credentials("contoso"));
    let token = provider.get_token().await.unwrap();
    assert_eq!(token, "token-1");
}

#[tokio::test]
async fn test_token_rejection_surfaces_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contoso/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&mock_server)
        .await;

    let provider = TokenProvider::new(&mock_server.uri(), credentials("contoso"));
    let err = provider.get_token().await.unwrap_err();
    assert!(matches!(err, TokenError::Rejected { status: 401, .. }));
}

#[tokio::test]
async fn test_create_user_posts_directory_shape() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "contoso", "app-token").await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("authorization", "Bearer app-token"))
        .and(body_partial_json(json!({
            "accountEnabled": true,
            "displayName": "Ana Lopez",
            "mailNickname": "ana.lopez",
            "userPrincipalName": "ana.lopez@flwins.example",
            "mail": "ana.lopez@flwins.example",
            "givenName": "Ana",
            "surname": "Lopez",
            "jobTitle": "Case Worker",
            "passwordProfile": { "forceChangePasswordNextSignIn": true }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "new-user-1" })))
        .mount(&mock_server)
        .await;

    let mut config = test_config();
    config.login_base_url = mock_server.uri();
    config.graph_base_url = mock_server.uri();

    let provisioner = AccountProvisioner::new(&config, credentials("contoso"));
    let result = provisioner
        .create_user(&intake_record("ana.lopez@flwins.example"), &DomainCache::new())
        .await
        .unwrap();

    assert!(result.created);
    assert_eq!(result.user_id, "new-user-1");
    // Response carried no principal name, so the derived one is kept.
    assert_eq!(result.user_principal_name, "ana.lopez@flwins.example");

    let password = result.initial_password;
    assert!((16..=20).contains(&password.len()));
    assert!(password.chars().filter(|c| c.is_ascii_uppercase()).count() >= 4);
    assert!(password.chars().filter(|c| c.is_ascii_lowercase()).count() >= 4);
    assert!(password.chars().filter(|c| c.is_ascii_digit()).count() >= 4);
    assert!(password.chars().filter(|c| !c.is_ascii_alphanumeric()).count() >= 4);
}

#[tokio::test]
async fn test_create_user_falls_back_to_verified_domain() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "contoso", "app-token").await;

    // The organization endpoint must be hit exactly once across both calls.
    Mock::given(method("GET"))
        .and(path("/organization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "verifiedDomains": [
                    { "name": "contoso.mail.onmicrosoft.com", "isInitial": false },
                    { "name": "contoso.com", "isDefault": true }
                ]
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_partial_json(json!({
            "userPrincipalName": "ana.lopez@contoso.com"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "u-2" })))
        .mount(&mock_server)
        .await;

    let mut config = test_config();
    config.login_base_url = mock_server.uri();
    config.graph_base_url = mock_server.uri();

    let provisioner = AccountProvisioner::new(&config, credentials("contoso"));
    let cache = DomainCache::new();

    // Intake carries no usable email, so the UPN comes from first.last
    // plus the tenant's default domain.
    let first = provisioner
        .create_user(&intake_record("ana-intake"), &cache)
        .await
        .unwrap();
    assert_eq!(first.user_principal_name, "ana.lopez@contoso.com");

    let second = provisioner
        .create_user(&intake_record("ana-intake"), &cache)
        .await
        .unwrap();
    assert_eq!(second.user_principal_name, "ana.lopez@contoso.com");
}

#[tokio::test]
async fn test_upn_override_skips_domain_lookup() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "contoso", "app-token").await;

    // No /organization mock: a lookup would 404 and fail the call.
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_partial_json(json!({
            "userPrincipalName": "ana.lopez@flwins.gov"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "u-3" })))
        .mount(&mock_server)
        .await;

    let mut config = test_config();
    config.login_base_url = mock_server.uri();
    config.graph_base_url = mock_server.uri();
    config.upn_domain = Some("flwins.gov".to_string());

    let provisioner = AccountProvisioner::new(&config, credentials("contoso"));
    let result = provisioner
        .create_user(&intake_record("ana-intake"), &DomainCache::new())
        .await
        .unwrap();

    assert_eq!(result.user_principal_name, "ana.lopez@flwins.gov");
}

#[tokio::test]
async fn test_invitation_returns_redeem_deep_link() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "efsmod-tenant", "efsmod-token").await;

    Mock::given(method("POST"))
        .and(path("/invitations"))
        .and(header("authorization", "Bearer efsmod-token"))
        .and(body_partial_json(json!({
            "invitedUserEmailAddress": "ana@example.com",
            "inviteRedirectUrl": "https://partner.example.com/welcome",
            "sendInvitationMessage": false,
            "invitedUserDisplayName": "Ana Lopez"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "inviteRedeemUrl": "https://login.microsoftonline.com/redeem/abc",
            "invitedUser": { "id": "guest-1" },
            "status": "PendingAcceptance"
        })))
        .mount(&mock_server)
        .await;

    let mut config = test_config();
    config.login_base_url = mock_server.uri();
    config.graph_base_url = mock_server.uri();
    config.efsmod_base_url = Some("https://partner.example.com".to_string());
    config.efsmod_redirect_path = "/welcome".to_string();

    let inviter = EfsmodInviter::new(&config, credentials("efsmod-tenant")).unwrap();
    let invite = inviter.invite(&intake_record("ana@example.com")).await.unwrap();

    assert!(invite.invited);
    assert_eq!(invite.invited_email, "ana@example.com");
    assert_eq!(invite.invited_user_id.as_deref(), Some("guest-1"));
    assert_eq!(invite.deep_link, "https://login.microsoftonline.com/redeem/abc");
    assert!(invite.login_link.contains("/efsmod-tenant/oauth2/v2.0/authorize"));
    assert!(invite.login_link.contains("login_hint=ana%40example.com"));
}

#[tokio::test]
async fn test_invitation_without_redeem_url_falls_back_to_login_link() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "efsmod-tenant", "efsmod-token").await;

    Mock::given(method("POST"))
        .and(path("/invitations"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "invitedUser": { "id": "guest-1" }
        })))
        .mount(&mock_server)
        .await;

    let mut config = test_config();
    config.login_base_url = mock_server.uri();
    config.graph_base_url = mock_server.uri();
    config.efsmod_base_url = Some("https://partner.example.com".to_string());

    let inviter = EfsmodInviter::new(&config, credentials("efsmod-tenant")).unwrap();
    let invite = inviter.invite(&intake_record("ana@example.com")).await.unwrap();

    assert!(invite.invite_redeem_url.is_none());
    assert_eq!(invite.deep_link, invite.login_link);
}

#[tokio::test]
async fn test_inviter_requires_base_url() {
    let config = test_config();
    let err = EfsmodInviter::new(&config, credentials("efsmod-tenant")).unwrap_err();
    assert!(matches!(err, ProvisionError::Configuration(_)));
}

#[tokio::test]
async fn test_invite_rejects_bad_email() {
    let mut config = test_config();
    config.efsmod_base_url = Some("https://partner.example.com".to_string());

    let inviter = EfsmodInviter::new(&config, credentials("efsmod-tenant")).unwrap();
    let result = inviter.invite(&intake_record("not-an-email")).await;
    assert!(matches!(result, Err(ProvisionError::Validation(_))));
}
