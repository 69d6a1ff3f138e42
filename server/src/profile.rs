use serde::Serialize;

use crate::auth::{ClaimField, ClientPrincipal};
use crate::graph::GraphUser;

/// Per-request aggregate of token claims and optional live Graph fields.
/// Recomputed on every call; never cached or persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub user_principal_name: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub office_location: Option<String>,
    pub mobile_phone: Option<String>,
    pub business_phones: Vec<String>,
}

/// Base fields come from claims; Graph wins field-by-field when its value
/// is non-empty.
pub fn build_profile(principal: &ClientPrincipal, graph: Option<&GraphUser>) -> Profile {
    let mut profile = Profile {
        user_id: principal.stable_id().map(String::from),
        display_name: principal.claim(ClaimField::Name).map(String::from),
        given_name: principal.claim(ClaimField::GivenName).map(String::from),
        surname: principal.claim(ClaimField::Surname).map(String::from),
        email: principal.claim(ClaimField::Email).map(String::from),
        user_principal_name: None,
        job_title: None,
        department: None,
        office_location: None,
        mobile_phone: None,
        business_phones: Vec::new(),
    };

    if let Some(graph) = graph {
        overlay(&mut profile.user_id, &graph.id);
        overlay(&mut profile.display_name, &graph.display_name);
        overlay(&mut profile.given_name, &graph.given_name);
        overlay(&mut profile.surname, &graph.surname);
        overlay(&mut profile.email, &graph.mail);
        overlay(&mut profile.user_principal_name, &graph.user_principal_name);
        overlay(&mut profile.job_title, &graph.job_title);
        overlay(&mut profile.department, &graph.department);
        overlay(&mut profile.office_location, &graph.office_location);
        overlay(&mut profile.mobile_phone, &graph.mobile_phone);
        if !graph.business_phones.is_empty() {
            profile.business_phones = graph.business_phones.clone();
        }
    }

    profile
}

fn overlay(field: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value {
        if !value.trim().is_empty() {
            *field = Some(value.clone());
        }
    }
}
