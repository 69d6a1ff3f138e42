use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Per-field caps applied before persistence. Email follows the RFC 5321
// mailbox limit; the rest are storage bounds, not format validation.
const MAX_NAME: usize = 128;
const MAX_EMAIL: usize = 254;
const MAX_TEXT: usize = 256;
const MAX_POSTAL: usize = 32;
const MAX_PHONE: usize = 64;

/// Intake form payload as posted by the browser. Every field is optional;
/// the route decides which ones it can live without.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntakeSubmission {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub office_location: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "state")]
    pub state_region: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub mobile_phone: Option<String>,
}

impl IntakeSubmission {
    /// Trim every field, drop the ones left empty, and cap lengths.
    pub fn sanitized(&self) -> IntakeSubmission {
        IntakeSubmission {
            email: clean(&self.email, MAX_EMAIL),
            first_name: clean(&self.first_name, MAX_NAME),
            last_name: clean(&self.last_name, MAX_NAME),
            display_name: clean(&self.display_name, MAX_NAME),
            job_title: clean(&self.job_title, MAX_TEXT),
            department: clean(&self.department, MAX_TEXT),
            office_location: clean(&self.office_location, MAX_TEXT),
            address_line1: clean(&self.address_line1, MAX_TEXT),
            address_line2: clean(&self.address_line2, MAX_TEXT),
            city: clean(&self.city, MAX_TEXT),
            state_region: clean(&self.state_region, MAX_TEXT),
            postal_code: clean(&self.postal_code, MAX_POSTAL),
            phone: clean(&self.phone, MAX_PHONE),
            mobile_phone: clean(&self.mobile_phone, MAX_PHONE),
        }
    }
}

fn clean(value: &Option<String>, max: usize) -> Option<String> {
    let trimmed = value.as_deref()?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max).collect())
}

/// Persisted intake row. At most one per user; upsert is the only
/// mutation path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeRecord {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub office_location: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "state")]
    pub state_region: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
