use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::consent::ConsentService;
use crate::config::{decode_token_secret, AppConfig};
use crate::error::AuthError;
use crate::repos::ServiceRegistry;

/// Signing material and expiry window for service tokens.
///
/// Built once at startup from [`AppConfig`] and immutable afterwards. There is
/// no server-side token store; rotating the secret invalidates every token
/// issued before the rotation.
#[derive(Clone)]
pub struct TokenConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: &[u8], ttl_minutes: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // The expiry window is exact; no clock-skew allowance.
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn from_app_config(config: &AppConfig) -> anyhow::Result<Self> {
        let secret = decode_token_secret(&config.auth.token_secret_base64)?;
        Ok(Self::new(&secret, config.auth.token_ttl_minutes))
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig").field("ttl", &self.ttl).finish()
    }
}

/// Claims carried inside a signed service token.
///
/// `authenticated_to` is the ordered set of service identifiers the holder was
/// authorized for when the token was minted, serialized as a JSON array so an
/// identifier can never collide with a delimiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTokenClaims {
    sub: i32,
    authenticated_to: Vec<String>,
    iat: i64,
    exp: i64,
}

impl ServiceTokenClaims {
    pub fn user_id(&self) -> i32 {
        self.sub
    }

    pub fn authenticated_to(&self) -> &[String] {
        &self.authenticated_to
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    /// Membership check against the issuance-time snapshot.
    ///
    /// This does not consult the consent store: a consent revoked after
    /// issuance leaves outstanding tokens scoped as they were until they
    /// expire or are re-issued. Data-serving callers that need to honor
    /// revocation immediately re-check with
    /// [`ConsentService::is_authorized`](crate::auth::ConsentService::is_authorized).
    pub fn is_authorized_for(&self, service_identifier: &str) -> bool {
        self.authenticated_to
            .iter()
            .any(|s| s == service_identifier)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// The scope that made it into the token. Empty means "authenticated to
    /// the system but to no external service"; issuance still succeeds.
    pub authenticated_to: Vec<String>,
}

/// Mints tokens scoped to the services the user has consented to.
#[derive(Clone)]
pub struct TokenIssuer {
    config: TokenConfig,
    registry: Arc<dyn ServiceRegistry>,
    consents: ConsentService,
}

impl TokenIssuer {
    pub fn new(
        config: TokenConfig,
        registry: Arc<dyn ServiceRegistry>,
        consents: ConsentService,
    ) -> Self {
        Self { config, registry, consents }
    }

    /// Resolves each requested identifier and keeps it in scope only if the
    /// user's consent covers the service's declared permission mask. An
    /// identifier that is not registered fails the whole issuance.
    pub async fn issue(
        &self,
        user_id: i32,
        requested: &[String],
    ) -> Result<IssuedToken, AuthError> {
        let mut scoped: Vec<String> = Vec::with_capacity(requested.len());
        for identifier in requested {
            let service = self
                .registry
                .find_service_by_identifier(identifier)
                .await
                .map_err(AuthError::StoreUnavailable)?
                .ok_or_else(|| AuthError::UnknownService(identifier.clone()))?;
            if scoped.contains(&service.service_identifier) {
                continue;
            }
            if self
                .consents
                .is_authorized(user_id, service.id, service.data_permissions)
                .await?
            {
                scoped.push(service.service_identifier);
            }
        }

        let now = Utc::now();
        let claims = ServiceTokenClaims {
            sub: user_id,
            authenticated_to: scoped.clone(),
            iat: now.timestamp(),
            exp: (now + self.config.ttl).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.config.encoding_key)
            .map_err(|e| AuthError::StoreUnavailable(anyhow::anyhow!("token signing failed: {}", e)))?;
        Ok(IssuedToken { token, authenticated_to: claims.authenticated_to })
    }
}

/// Validates presented tokens: signature, then expiry, then claim structure.
#[derive(Clone)]
pub struct TokenVerifier {
    config: TokenConfig,
}

impl TokenVerifier {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    pub fn verify(&self, token: &str) -> Result<ServiceTokenClaims, AuthError> {
        decode::<ServiceTokenClaims>(token, &self.config.decoding_key, &self.config.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::MalformedClaims,
            })
    }
}
