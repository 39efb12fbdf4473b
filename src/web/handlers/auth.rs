use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::app::AppState;
use crate::auth::{self, password, ServiceTokenClaims};
use crate::error::AuthError;
use crate::models::NewUser;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub screen_name: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i32,
    pub username: String,
    pub screen_name: String,
    pub email: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, AuthError> {
    let existing = state
        .credentials
        .find_user_by_username(&body.username)
        .await
        .map_err(AuthError::StoreUnavailable)?;
    if existing.is_some() {
        return Ok((
            StatusCode::CONFLICT,
            Json(json!({ "error": "username taken" })),
        )
            .into_response());
    }

    let salt = password::generate_salt();
    let password_hash =
        password::hash_password(&body.password, &salt).map_err(AuthError::StoreUnavailable)?;

    let user = state
        .credentials
        .create_user(NewUser {
            username: body.username,
            screen_name: body.screen_name.unwrap_or_default(),
            email: body.email,
            password_hash,
            salt,
        })
        .await
        .map_err(AuthError::StoreUnavailable)?;

    let response = RegisterResponse {
        id: user.id,
        username: user.username,
        screen_name: user.screen_name,
        email: user.email,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub username: String,
    pub password: String,
    /// Service identifiers the caller wants the token scoped to.
    #[serde(default)]
    pub services: Vec<String>,
    /// When true, respond with a redirect to the first scoped service's
    /// registered URL, token attached, instead of a JSON body.
    #[serde(default)]
    pub redirect: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthTokenResponse {
    pub token: String,
    pub authenticated_to: Vec<String>,
    pub expires_in: i64,
}

pub async fn authenticate(
    State(state): State<AppState>,
    Json(body): Json<AuthenticateRequest>,
) -> Result<Response, AuthError> {
    let user = auth::authenticate(state.credentials.as_ref(), &body.username, &body.password).await?;
    let issued = state.issuer.issue(user.id, &body.services).await?;

    if body.redirect {
        if let Some(identifier) = issued.authenticated_to.first() {
            let service = state
                .registry
                .find_service_by_identifier(identifier)
                .await
                .map_err(AuthError::StoreUnavailable)?
                .ok_or_else(|| AuthError::UnknownService(identifier.clone()))?;
            return Ok(redirect_with_token(&service.redirect_url, &issued.token));
        }
    }

    let response = AuthTokenResponse {
        token: issued.token,
        authenticated_to: issued.authenticated_to,
        expires_in: state.config.auth.token_ttl_minutes * 60,
    };
    Ok(Json(response).into_response())
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<ServiceTokenClaims>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Response, AuthError> {
    let user = state
        .credentials
        .find_user_by_id(claims.user_id())
        .await
        .map_err(AuthError::StoreUnavailable)?
        .ok_or(AuthError::CredentialInvalid)?;

    match password::verify_password(&body.current_password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return Err(AuthError::CredentialInvalid),
        Err(e) => return Err(AuthError::StoreUnavailable(e)),
    }

    let salt = password::generate_salt();
    let password_hash =
        password::hash_password(&body.new_password, &salt).map_err(AuthError::StoreUnavailable)?;
    state
        .credentials
        .update_password(user.id, &password_hash, &salt)
        .await
        .map_err(AuthError::StoreUnavailable)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

fn redirect_with_token(redirect_url: &str, token: &str) -> Response {
    if let Ok(mut url) = Url::parse(redirect_url) {
        url.query_pairs_mut().append_pair("token", token);
        return Redirect::temporary(url.as_str()).into_response();
    }
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid_redirect_url" })),
    )
        .into_response()
}
