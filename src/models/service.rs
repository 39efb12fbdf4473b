use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A registered downstream service (calendar, radio app, ...).
///
/// `data_permissions` is the bitmask of personal-data fields the service has
/// declared it needs. The bit layout is registry policy; nothing in this crate
/// assigns meaning to individual bits.
#[derive(Debug, Clone, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::services)]
pub struct Service {
    pub id: i32,
    pub service_identifier: String,
    pub service_name: String,
    pub display_name: String,
    pub redirect_url: String,
    pub data_permissions: i32,
    pub created: String,
    pub modified: String,
}
