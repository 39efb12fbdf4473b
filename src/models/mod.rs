pub mod consent;
pub mod service;
pub mod user;

pub use consent::{ConsentState, ServiceConsent};
pub use service::Service;
pub use user::{NewUser, User};

use time::OffsetDateTime;

/// Format a timestamp as RFC 3339 for consistent text-column storage.
pub fn format_rfc3339(dt: OffsetDateTime) -> String {
    dt.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| dt.to_string())
}

pub fn now_rfc3339() -> String {
    format_rfc3339(OffsetDateTime::now_utc())
}
