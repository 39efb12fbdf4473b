use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::app::AppState;
use crate::auth::ServiceTokenClaims;
use crate::error::AuthError;
use crate::models::{ConsentState, Service, ServiceConsent};

#[derive(Debug, Serialize)]
pub struct ConsentResponse {
    pub service_identifier: String,
    pub state: ConsentState,
    pub data_permissions: i32,
    pub created: String,
    pub modified: String,
}

impl ConsentResponse {
    fn from_row(service: &Service, row: ServiceConsent) -> Self {
        Self {
            service_identifier: service.service_identifier.clone(),
            state: row.state(),
            data_permissions: row.data_permissions,
            created: row.created,
            modified: row.modified,
        }
    }
}

pub async fn get_consent(
    State(state): State<AppState>,
    Extension(claims): Extension<ServiceTokenClaims>,
    Path(service_identifier): Path<String>,
) -> Result<Response, AuthError> {
    let service = resolve_service(&state, &service_identifier).await?;
    let row = state.consents.get_consent(claims.user_id(), service.id).await?;
    match row {
        Some(row) => Ok(Json(ConsentResponse::from_row(&service, row)).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "consent not found" })),
        )
            .into_response()),
    }
}

#[derive(Debug, Deserialize)]
pub struct GrantConsentRequest {
    /// Bitmask of data fields the user releases to the service.
    pub data_permissions: i32,
}

pub async fn grant_consent(
    State(state): State<AppState>,
    Extension(claims): Extension<ServiceTokenClaims>,
    Path(service_identifier): Path<String>,
    Json(body): Json<GrantConsentRequest>,
) -> Result<Response, AuthError> {
    let service = resolve_service(&state, &service_identifier).await?;
    let row = state
        .consents
        .grant_consent(
            claims.user_id(),
            service.id,
            ConsentState::Agreed,
            body.data_permissions,
        )
        .await?;
    Ok(Json(ConsentResponse::from_row(&service, row)).into_response())
}

pub async fn revoke_consent(
    State(state): State<AppState>,
    Extension(claims): Extension<ServiceTokenClaims>,
    Path(service_identifier): Path<String>,
) -> Result<Response, AuthError> {
    let service = resolve_service(&state, &service_identifier).await?;
    state.consents.revoke(claims.user_id(), service.id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn resolve_service(state: &AppState, identifier: &str) -> Result<Service, AuthError> {
    state
        .registry
        .find_service_by_identifier(identifier)
        .await
        .map_err(AuthError::StoreUnavailable)?
        .ok_or_else(|| AuthError::UnknownService(identifier.to_string()))
}
