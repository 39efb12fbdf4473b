use async_trait::async_trait;

use crate::models::{ConsentState, NewUser, Service, ServiceConsent, User};

/// Credential lookup and maintenance, keyed by username or numeric id.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_id(&self, user_id: i32) -> anyhow::Result<Option<User>>;
    async fn create_user(&self, new_user: NewUser) -> anyhow::Result<User>;
    async fn update_password(
        &self,
        user_id: i32,
        password_hash: &str,
        salt: &str,
    ) -> anyhow::Result<()>;
}

/// Read-only lookup of registered services and their declared permission
/// masks. Registration itself happens outside this system.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn find_service_by_identifier(&self, identifier: &str)
        -> anyhow::Result<Option<Service>>;
    async fn find_service_by_id(&self, service_id: i32) -> anyhow::Result<Option<Service>>;
    async fn list_services(&self) -> anyhow::Result<Vec<Service>>;
}

/// Persistence of per-(user, service) consent rows.
///
/// `upsert_consent` must be atomic with respect to the unique
/// (user_id, service_id) constraint: concurrent grants for the same pair
/// resolve as last-write-wins at the store, never as a duplicate row.
#[async_trait]
pub trait ConsentStore: Send + Sync {
    async fn read_consent(
        &self,
        user_id: i32,
        service_id: i32,
    ) -> anyhow::Result<Option<ServiceConsent>>;

    /// Inserts or updates the single row for the pair. `created` is set only
    /// on first insert; `modified` is refreshed on every call.
    async fn upsert_consent(
        &self,
        user_id: i32,
        service_id: i32,
        state: ConsentState,
        data_permissions: i32,
    ) -> anyhow::Result<ServiceConsent>;

    /// Updates the state of an existing row, refreshing `modified`. A missing
    /// row is not an error; revocation of a never-granted consent is a no-op.
    async fn set_consent_state(
        &self,
        user_id: i32,
        service_id: i32,
        state: ConsentState,
    ) -> anyhow::Result<()>;

    /// Moves every `Agreed` row for the service to `AgreedOutdated`; returns
    /// the number of rows touched.
    async fn mark_policy_outdated(&self, service_id: i32) -> anyhow::Result<usize>;
}

pub mod sqlite;
