use std::sync::Arc;

use crate::error::AuthError;
use crate::models::{ConsentState, ServiceConsent};
use crate::repos::ConsentStore;

/// True iff every bit the service requires is present in the granted mask.
/// Masks are opaque here; bit assignments belong to the service registry.
pub fn mask_covers(granted: i32, required: i32) -> bool {
    granted & required == required
}

/// Bitmask authorization over the consent store.
///
/// Authorization is all-or-nothing per service: a grant that covers only part
/// of the required mask does not authorize anything. Which individual fields
/// get serialized to a response is a separate filtering step applied after
/// this check passes.
#[derive(Clone)]
pub struct ConsentService {
    store: Arc<dyn ConsentStore>,
}

impl ConsentService {
    pub fn new(store: Arc<dyn ConsentStore>) -> Self {
        Self { store }
    }

    pub async fn get_consent(
        &self,
        user_id: i32,
        service_id: i32,
    ) -> Result<Option<ServiceConsent>, AuthError> {
        self.store
            .read_consent(user_id, service_id)
            .await
            .map_err(AuthError::StoreUnavailable)
    }

    pub async fn grant_consent(
        &self,
        user_id: i32,
        service_id: i32,
        state: ConsentState,
        data_permissions: i32,
    ) -> Result<ServiceConsent, AuthError> {
        self.store
            .upsert_consent(user_id, service_id, state, data_permissions)
            .await
            .map_err(AuthError::StoreUnavailable)
    }

    /// Returns the row to `NotAgreed`, keeping the row and its history.
    /// Calling this for a pair that was never granted, or twice in a row, is
    /// not an error.
    pub async fn revoke(&self, user_id: i32, service_id: i32) -> Result<(), AuthError> {
        self.store
            .set_consent_state(user_id, service_id, ConsentState::NotAgreed)
            .await
            .map_err(AuthError::StoreUnavailable)
    }

    /// Flags all current `Agreed` rows for a service as agreed-to-an-outdated
    /// policy. Run when the service's privacy policy text is replaced.
    pub async fn mark_policy_outdated(&self, service_id: i32) -> Result<usize, AuthError> {
        self.store
            .mark_policy_outdated(service_id)
            .await
            .map_err(AuthError::StoreUnavailable)
    }

    /// The field-authorization check: true iff a consent row exists, its state
    /// is an agreed variant, and the granted mask covers the required mask.
    ///
    /// This always reads live consent state, so callers serving data can use
    /// it to honor a revocation immediately, independent of what any
    /// outstanding token still claims.
    pub async fn is_authorized(
        &self,
        user_id: i32,
        service_id: i32,
        required_mask: i32,
    ) -> Result<bool, AuthError> {
        let consent = self.get_consent(user_id, service_id).await?;
        Ok(match consent {
            Some(row) => row.state().is_agreed() && mask_covers(row.data_permissions, required_mask),
            None => false,
        })
    }
}
