use std::future::Future;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::IntakeRecord;

use super::ProvisionError;

const MAX_NICKNAME: usize = 64;
const DEFAULT_DISPLAY_NAME: &str = "FLWINS User";
const DEFAULT_NICKNAME: &str = "user";

/// `first last` when both are present, else the provided display name,
/// else a fixed default.
pub fn derive_display_name(intake: &IntakeRecord) -> String {
    match (&intake.first_name, &intake.last_name) {
        (Some(first), Some(last)) => format!("{} {}", first, last),
        _ => intake
            .display_name
            .clone()
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
    }
}

/// Directory mail nickname: the local part of the email, else `first.last`.
/// Diacritics are folded to ASCII, anything outside `[A-Za-z0-9._-]` is
/// dropped, and the result is lowercased, capped, and stripped of edge
/// separators. An empty result becomes `"user"`.
pub fn derive_mail_nickname(intake: &IntakeRecord) -> String {
    let source = match intake.email.split_once('@') {
        Some((local, _)) => local.to_string(),
        None => match (&intake.first_name, &intake.last_name) {
            (Some(first), Some(last)) => format!("{}.{}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::new(),
        },
    };

    let folded: String = source.nfd().filter(|c| !is_combining_mark(*c)).collect();

    let cleaned: String = folded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_NICKNAME)
        .collect();

    let trimmed = cleaned.trim_matches(|c| matches!(c, '.' | '_' | '-'));
    if trimmed.is_empty() {
        DEFAULT_NICKNAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// User principal name for a new directory account. A usable intake email
/// is taken verbatim; otherwise `nickname@domain`, where the domain is the
/// configured override or the tenant's verified domain. The domain is only
/// fetched when that last branch is reached.
pub async fn derive_principal_name<F, Fut>(
    email: &str,
    nickname: &str,
    domain_override: Option<&str>,
    resolve_domain: F,
) -> Result<String, ProvisionError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<String>, ProvisionError>>,
{
    if email.contains('@') {
        return Ok(email.to_string());
    }

    if let Some(domain) = domain_override {
        return Ok(format!("{}@{}", nickname, domain));
    }

    match resolve_domain().await? {
        Some(domain) => Ok(format!("{}@{}", nickname, domain)),
        None => Err(ProvisionError::Configuration(
            "tenant has no verified domains".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn intake(email: &str, first: Option<&str>, last: Option<&str>) -> IntakeRecord {
        IntakeRecord {
            id: "r-1".to_string(),
            user_id: "u-1".to_string(),
            email: email.to_string(),
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            display_name: None,
            job_title: None,
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

    #[test]
    fn test_display_name_from_first_and_last() {
        let record = intake("", Some("Ana"), Some("Lopez"));
        assert_eq!(derive_display_name(&record), "Ana Lopez");
    }

    #[test]
    fn test_display_name_falls_back_to_provided() {
        let mut record = intake("", Some("Ana"), None);
        record.display_name = Some("Ana L.".to_string());
        assert_eq!(derive_display_name(&record), "Ana L.");
    }

    #[test]
    fn test_display_name_default() {
        let record = intake("", None, None);
        assert_eq!(derive_display_name(&record), "FLWINS User");
    }

    #[test]
    fn test_nickname_from_email_local_part() {
        let record = intake("jane.doe@example.com", None, None);
        assert_eq!(derive_mail_nickname(&record), "jane.doe");
    }

    #[test]
    fn test_nickname_strips_diacritics() {
        let record = intake("", Some("José"), Some("Núñez"));
        assert_eq!(derive_mail_nickname(&record), "jose.nunez");
    }

    #[test]
    fn test_nickname_drops_forbidden_punctuation() {
        let record = intake("a+b!c@example.com", None, None);
        assert_eq!(derive_mail_nickname(&record), "abc");
    }

    #[test]
    fn test_nickname_trims_edge_separators() {
        let record = intake(".dots.@example.com", None, None);
        assert_eq!(derive_mail_nickname(&record), "dots");
    }

    #[test]
    fn test_nickname_empty_input_falls_back() {
        let record = intake("", None, None);
        assert_eq!(derive_mail_nickname(&record), "user");
    }

    #[test]
    fn test_nickname_caps_length() {
        let record = intake(&format!("{}@example.com", "x".repeat(100)), None, None);
        assert_eq!(derive_mail_nickname(&record).len(), 64);
    }

    #[tokio::test]
    async fn test_principal_name_uses_email_verbatim() {
        let upn = derive_principal_name(
            "ana@example.com",
            "ana.lopez",
            Some("contoso.com"),
            || async { panic!("domain must not be resolved when the email is usable") },
        )
        .await
        .unwrap();
        assert_eq!(upn, "ana@example.com");
    }

    #[tokio::test]
    async fn test_principal_name_override_replaces_missing_domain() {
        let upn = derive_principal_name("ana-at-example", "ana.lopez", Some("contoso.com"), || async {
            panic!("domain must not be resolved when an override is set")
        })
        .await
        .unwrap();
        assert_eq!(upn, "ana.lopez@contoso.com");
    }

    #[tokio::test]
    async fn test_principal_name_resolves_domain() {
        let upn = derive_principal_name("", "ana.lopez", None, || async {
            Ok(Some("contoso.onmicrosoft.com".to_string()))
        })
        .await
        .unwrap();
        assert_eq!(upn, "ana.lopez@contoso.onmicrosoft.com");
    }

    #[tokio::test]
    async fn test_principal_name_without_domain_is_configuration_error() {
        let result = derive_principal_name("", "ana.lopez", None, || async { Ok(None) }).await;
        assert!(matches!(result, Err(ProvisionError::Configuration(_))));
    }
}
