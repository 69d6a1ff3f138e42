use serde::{Deserialize, Serialize};

/// A single claim as forwarded by the authentication platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub typ: String,
    pub val: String,
}

/// Profile fields that can arrive under more than one claim-type spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimField {
    UserId,
    Email,
    Name,
    GivenName,
    Surname,
}

/// Accepted claim-type spellings per field, in priority order.
///
/// Azure AD v1 tokens carry long-form URI claim types while v2 tokens use
/// short names; which one shows up depends on the app registration. The
/// table is explicit so the lookup order is auditable in one place.
const CLAIM_ALIASES: &[(ClaimField, &[&str])] = &[
    (
        ClaimField::UserId,
        &[
            "http://schemas.microsoft.com/identity/claims/objectidentifier",
            "oid",
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
            "sub",
        ],
    ),
    (
        ClaimField::Email,
        &[
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress",
            "emails",
            "email",
            "preferred_username",
            "upn",
        ],
    ),
    (
        ClaimField::Name,
        &[
            "name",
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name",
        ],
    ),
    (
        ClaimField::GivenName,
        &[
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/givenname",
            "given_name",
        ],
    ),
    (
        ClaimField::Surname,
        &[
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/surname",
            "family_name",
        ],
    ),
];

/// Claim-type spellings accepted for `field`, highest priority first.
pub fn aliases(field: ClaimField) -> &'static [&'static str] {
    CLAIM_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}
