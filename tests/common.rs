#![allow(dead_code)]

use axum::Router;
use base64::Engine as _;
use diesel::prelude::*;
use tempfile::TempDir;

use memberid::app::{build_router, AppState};
use memberid::auth::password;
use memberid::config::{AppConfig, AuthCfg, DbCfg, ServerCfg};
use memberid::db::{self, DbPool};
use memberid::models::{now_rfc3339, ConsentState};
use memberid::schema::{services, user_service_consents, users};

pub struct TestDb {
    pub _dir: TempDir,
    pub path: String,
    pub pool: DbPool,
}

pub fn init_test_db() -> anyhow::Result<TestDb> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("test.sqlite");
    let path_str = db_path.display().to_string();

    let pool = db::init_pool(&path_str)?;
    {
        let mut conn = pool.get()?;
        db::run_migrations(&mut conn)?;
    }

    Ok(TestDb { _dir: dir, path: path_str, pool })
}

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        server: ServerCfg {
            bind_addr: "127.0.0.1:0".into(),
            public_url: "http://127.0.0.1:0".into(),
        },
        db: DbCfg { url: database_url.to_string() },
        auth: AuthCfg {
            token_secret_base64: base64::engine::general_purpose::STANDARD.encode([7u8; 32]),
            token_ttl_minutes: 60,
        },
    }
}

pub fn build_test_app(config: AppConfig, pool: DbPool) -> Router {
    let state = AppState::new(config, pool).expect("app state");
    build_router(state)
}

pub fn seed_user(pool: &DbPool, username: &str, plain_password: &str) -> i32 {
    let salt = password::generate_salt();
    let hash = password::hash_password(plain_password, &salt).expect("hash");
    let now = now_rfc3339();
    let mut conn = pool.get().expect("db conn");
    diesel::insert_into(users::table)
        .values((
            users::username.eq(username),
            users::screen_name.eq(username),
            users::email.eq(format!("{}@example.com", username)),
            users::password_hash.eq(&hash),
            users::salt.eq(&salt),
            users::created.eq(&now),
            users::modified.eq(&now),
        ))
        .execute(&mut conn)
        .expect("insert user");
    users::table
        .filter(users::username.eq(username))
        .select(users::id)
        .first::<i32>(&mut conn)
        .expect("user id")
}

pub fn seed_service(pool: &DbPool, identifier: &str, name: &str, data_permissions: i32) -> i32 {
    let now = now_rfc3339();
    let mut conn = pool.get().expect("db conn");
    diesel::insert_into(services::table)
        .values((
            services::service_identifier.eq(identifier),
            services::service_name.eq(name),
            services::display_name.eq(name),
            services::redirect_url.eq(format!("https://{}.example.com", name)),
            services::data_permissions.eq(data_permissions),
            services::created.eq(&now),
            services::modified.eq(&now),
        ))
        .execute(&mut conn)
        .expect("insert service");
    services::table
        .filter(services::service_identifier.eq(identifier))
        .select(services::id)
        .first::<i32>(&mut conn)
        .expect("service id")
}

pub fn seed_consent(
    pool: &DbPool,
    user_id: i32,
    service_id: i32,
    state: ConsentState,
    data_permissions: i32,
) {
    let now = now_rfc3339();
    let mut conn = pool.get().expect("db conn");
    diesel::insert_into(user_service_consents::table)
        .values((
            user_service_consents::user_id.eq(user_id),
            user_service_consents::service_id.eq(service_id),
            user_service_consents::consent.eq(state.as_i32()),
            user_service_consents::data_permissions.eq(data_permissions),
            user_service_consents::created.eq(&now),
            user_service_consents::modified.eq(&now),
        ))
        .execute(&mut conn)
        .expect("insert consent");
}
