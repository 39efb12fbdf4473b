use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Privacy-consent acceptance state for one (user, service) pair.
///
/// Stored as an integer column. `AgreedOutdated` means the user agreed to an
/// earlier revision of the service's privacy policy; it still counts as an
/// agreed variant for authorization until the user re-consents or revokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentState {
    NotAgreed,
    Agreed,
    AgreedOutdated,
}

impl ConsentState {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(ConsentState::NotAgreed),
            1 => Some(ConsentState::Agreed),
            2 => Some(ConsentState::AgreedOutdated),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            ConsentState::NotAgreed => 0,
            ConsentState::Agreed => 1,
            ConsentState::AgreedOutdated => 2,
        }
    }

    pub fn is_agreed(self) -> bool {
        matches!(self, ConsentState::Agreed | ConsentState::AgreedOutdated)
    }
}

/// One consent row per (user, service) pair, enforced by a unique constraint.
///
/// `consent` holds the raw state column; `data_permissions` is the bitmask of
/// fields the user has granted to the service. Rows are mutated on re-consent
/// and revocation, never deleted.
#[derive(Debug, Clone, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::user_service_consents)]
pub struct ServiceConsent {
    pub id: i32,
    pub user_id: i32,
    pub service_id: i32,
    pub consent: i32,
    pub data_permissions: i32,
    pub created: String,
    pub modified: String,
}

impl ServiceConsent {
    /// Unknown column values fall back to `NotAgreed` (fail closed).
    pub fn state(&self) -> ConsentState {
        ConsentState::from_i32(self.consent).unwrap_or(ConsentState::NotAgreed)
    }
}
