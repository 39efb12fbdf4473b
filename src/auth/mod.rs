pub mod consent;
pub mod password;
pub mod token;

pub use consent::{mask_covers, ConsentService};
pub use token::{IssuedToken, ServiceTokenClaims, TokenConfig, TokenIssuer, TokenVerifier};

use crate::error::AuthError;
use crate::models::User;
use crate::repos::CredentialStore;

/// Checks a username/password pair against the credential store.
///
/// A missing user and a wrong password both come back as
/// [`AuthError::CredentialInvalid`] so responses cannot be used to enumerate
/// usernames. An unparseable stored digest surfaces as a store failure, not as
/// a mismatch.
pub async fn authenticate(
    credentials: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let user = credentials
        .find_user_by_username(username)
        .await
        .map_err(AuthError::StoreUnavailable)?
        .ok_or(AuthError::CredentialInvalid)?;

    match password::verify_password(password, &user.password_hash) {
        Ok(true) => Ok(user),
        Ok(false) => Err(AuthError::CredentialInvalid),
        Err(e) => Err(AuthError::StoreUnavailable(e)),
    }
}
