use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::ServiceTokenClaims;
use crate::error::AuthError;

#[derive(Debug, Deserialize)]
pub struct MeQuery {
    /// Service identifier on whose behalf the profile is being read.
    pub service: Option<String>,
}

/// Returns the holder's own profile.
///
/// When a `service` parameter is present the request is treated as a read on
/// behalf of that service: the token must have been scoped to it at issuance,
/// and the user's current consent must still cover the service's declared
/// mask. The second check is live, so a revocation takes effect here even
/// while older tokens are still circulating.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<ServiceTokenClaims>,
    Query(query): Query<MeQuery>,
) -> Result<Response, AuthError> {
    if let Some(identifier) = query.service.as_deref() {
        let service = state
            .registry
            .find_service_by_identifier(identifier)
            .await
            .map_err(AuthError::StoreUnavailable)?
            .ok_or_else(|| AuthError::UnknownService(identifier.to_string()))?;

        if !claims.is_authorized_for(&service.service_identifier) {
            return Err(AuthError::ConsentDenied);
        }
        let live = state
            .consents
            .is_authorized(claims.user_id(), service.id, service.data_permissions)
            .await?;
        if !live {
            return Err(AuthError::ConsentDenied);
        }
    }

    let user = state
        .credentials
        .find_user_by_id(claims.user_id())
        .await
        .map_err(AuthError::StoreUnavailable)?
        .ok_or(AuthError::CredentialInvalid)?;

    Ok(Json(user).into_response())
}
