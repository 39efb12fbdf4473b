use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failure taxonomy of the authentication and consent-authorization core.
///
/// At the HTTP boundary the credential and token variants collapse to one
/// generic body: callers never learn whether the username or the password was
/// wrong, nor which of signature/expiry/structure rejected a token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    CredentialInvalid,

    #[error("unknown service `{0}`")]
    UnknownService(String),

    #[error("consent does not cover the required permissions")]
    ConsentDenied,

    #[error("token signature mismatch")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed token claims")]
    MalformedClaims,

    #[error("store unavailable")]
    StoreUnavailable(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::CredentialInvalid
            | AuthError::InvalidSignature
            | AuthError::Expired
            | AuthError::MalformedClaims => StatusCode::UNAUTHORIZED,
            AuthError::ConsentDenied => StatusCode::FORBIDDEN,
            AuthError::UnknownService(_) => StatusCode::NOT_FOUND,
            AuthError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            AuthError::StoreUnavailable(e) => {
                tracing::error!(error = ?e, "store failure");
            }
            other => {
                tracing::debug!(reason = %other, "request rejected");
            }
        }

        let body = match status {
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::FORBIDDEN => "forbidden",
            StatusCode::NOT_FOUND => "unknown service",
            _ => "internal error",
        };
        (status, Json(json!({ "error": body }))).into_response()
    }
}
