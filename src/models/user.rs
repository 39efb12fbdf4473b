use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub screen_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub salt: String,
    pub created: String,
    pub modified: String,
}

/// Registration input. Timestamps are filled in by the store at insert time.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub screen_name: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
}
