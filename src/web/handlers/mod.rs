pub mod auth;
pub mod consent;
pub mod services;
pub mod users;
