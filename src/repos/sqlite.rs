use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::OptionalExtension;

use crate::db::DbPool;
use crate::models::{now_rfc3339, ConsentState, NewUser, Service, ServiceConsent, User};
use crate::repos::{ConsentStore, CredentialStore, ServiceRegistry};
use crate::schema::{services, user_service_consents, users};

pub struct SqliteIdentityRepo {
    pool: DbPool,
}

impl SqliteIdentityRepo {
    pub fn new(pool: DbPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl CredentialStore for SqliteIdentityRepo {
    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let username = username.to_string();
        let pool = self.pool.clone();
        let user = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<User>> {
            let mut conn = pool.get()?;
            let row = users::table
                .filter(users::username.eq(&username))
                .first::<User>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: i32) -> anyhow::Result<Option<User>> {
        let pool = self.pool.clone();
        let user = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<User>> {
            let mut conn = pool.get()?;
            let row = users::table
                .find(user_id)
                .first::<User>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> anyhow::Result<User> {
        let pool = self.pool.clone();
        let now = now_rfc3339();
        let user = tokio::task::spawn_blocking(move || -> anyhow::Result<User> {
            let mut conn = pool.get()?;
            conn.immediate_transaction(|conn| {
                diesel::insert_into(users::table)
                    .values((
                        users::username.eq(&new_user.username),
                        users::screen_name.eq(&new_user.screen_name),
                        users::email.eq(&new_user.email),
                        users::password_hash.eq(&new_user.password_hash),
                        users::salt.eq(&new_user.salt),
                        users::created.eq(&now),
                        users::modified.eq(&now),
                    ))
                    .execute(conn)?;
                let user = users::table
                    .filter(users::username.eq(&new_user.username))
                    .first::<User>(conn)?;
                Ok(user)
            })
        })
        .await??;
        Ok(user)
    }

    async fn update_password(
        &self,
        user_id: i32,
        password_hash: &str,
        salt: &str,
    ) -> anyhow::Result<()> {
        let password_hash = password_hash.to_string();
        let salt = salt.to_string();
        let pool = self.pool.clone();
        let now = now_rfc3339();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = pool.get()?;
            diesel::update(users::table.find(user_id))
                .set((
                    users::password_hash.eq(&password_hash),
                    users::salt.eq(&salt),
                    users::modified.eq(&now),
                ))
                .execute(&mut conn)?;
            Ok(())
        })
        .await??;
        Ok(())
    }
}

#[async_trait]
impl ServiceRegistry for SqliteIdentityRepo {
    async fn find_service_by_identifier(
        &self,
        identifier: &str,
    ) -> anyhow::Result<Option<Service>> {
        let identifier = identifier.to_string();
        let pool = self.pool.clone();
        let service = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<Service>> {
            let mut conn = pool.get()?;
            let row = services::table
                .filter(services::service_identifier.eq(&identifier))
                .first::<Service>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(service)
    }

    async fn find_service_by_id(&self, service_id: i32) -> anyhow::Result<Option<Service>> {
        let pool = self.pool.clone();
        let service = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<Service>> {
            let mut conn = pool.get()?;
            let row = services::table
                .find(service_id)
                .first::<Service>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(service)
    }

    async fn list_services(&self) -> anyhow::Result<Vec<Service>> {
        let pool = self.pool.clone();
        let rows = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<Service>> {
            let mut conn = pool.get()?;
            let rows = services::table
                .order(services::service_name.asc())
                .load::<Service>(&mut conn)?;
            Ok(rows)
        })
        .await??;
        Ok(rows)
    }
}

#[async_trait]
impl ConsentStore for SqliteIdentityRepo {
    async fn read_consent(
        &self,
        user_id: i32,
        service_id: i32,
    ) -> anyhow::Result<Option<ServiceConsent>> {
        let pool = self.pool.clone();
        let row = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<ServiceConsent>> {
            let mut conn = pool.get()?;
            let row = user_service_consents::table
                .filter(user_service_consents::user_id.eq(user_id))
                .filter(user_service_consents::service_id.eq(service_id))
                .first::<ServiceConsent>(&mut conn)
                .optional()?;
            Ok(row)
        })
        .await??;
        Ok(row)
    }

    async fn upsert_consent(
        &self,
        user_id: i32,
        service_id: i32,
        state: ConsentState,
        data_permissions: i32,
    ) -> anyhow::Result<ServiceConsent> {
        let pool = self.pool.clone();
        let now = now_rfc3339();
        let row = tokio::task::spawn_blocking(move || -> anyhow::Result<ServiceConsent> {
            let mut conn = pool.get()?;
            conn.immediate_transaction(|conn| {
                use user_service_consents::dsl as usc;
                diesel::insert_into(usc::user_service_consents)
                    .values((
                        usc::user_id.eq(user_id),
                        usc::service_id.eq(service_id),
                        usc::consent.eq(state.as_i32()),
                        usc::data_permissions.eq(data_permissions),
                        usc::created.eq(&now),
                        usc::modified.eq(&now),
                    ))
                    .on_conflict((usc::user_id, usc::service_id))
                    .do_update()
                    .set((
                        usc::consent.eq(state.as_i32()),
                        usc::data_permissions.eq(data_permissions),
                        usc::modified.eq(&now),
                    ))
                    .execute(conn)?;
                let row = usc::user_service_consents
                    .filter(usc::user_id.eq(user_id))
                    .filter(usc::service_id.eq(service_id))
                    .first::<ServiceConsent>(conn)?;
                Ok(row)
            })
        })
        .await??;
        Ok(row)
    }

    async fn set_consent_state(
        &self,
        user_id: i32,
        service_id: i32,
        state: ConsentState,
    ) -> anyhow::Result<()> {
        let pool = self.pool.clone();
        let now = now_rfc3339();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = pool.get()?;
            use user_service_consents::dsl as usc;
            diesel::update(
                usc::user_service_consents
                    .filter(usc::user_id.eq(user_id))
                    .filter(usc::service_id.eq(service_id)),
            )
            .set((usc::consent.eq(state.as_i32()), usc::modified.eq(&now)))
            .execute(&mut conn)?;
            Ok(())
        })
        .await??;
        Ok(())
    }

    async fn mark_policy_outdated(&self, service_id: i32) -> anyhow::Result<usize> {
        let pool = self.pool.clone();
        let now = now_rfc3339();
        let touched = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
            let mut conn = pool.get()?;
            use user_service_consents::dsl as usc;
            let n = diesel::update(
                usc::user_service_consents
                    .filter(usc::service_id.eq(service_id))
                    .filter(usc::consent.eq(ConsentState::Agreed.as_i32())),
            )
            .set((
                usc::consent.eq(ConsentState::AgreedOutdated.as_i32()),
                usc::modified.eq(&now),
            ))
            .execute(&mut conn)?;
            Ok(n)
        })
        .await??;
        Ok(touched)
    }
}
