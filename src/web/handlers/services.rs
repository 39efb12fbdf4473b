use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::app::AppState;
use crate::error::AuthError;

/// Public list of registered services, e.g. for a login page's service picker.
pub async fn list_services(State(state): State<AppState>) -> Result<Response, AuthError> {
    let services = state
        .registry
        .list_services()
        .await
        .map_err(AuthError::StoreUnavailable)?;
    Ok(Json(services).into_response())
}
