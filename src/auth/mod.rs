use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Session validity window. Issued tokens expire, nothing revokes them
/// earlier.
pub const SESSION_TTL_HOURS: i64 = 8;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Provider-assigned user id.
    pub id: Uuid,
    /// Display name captured at registration.
    pub name: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(id: Uuid, name: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            email,
            iat: now.timestamp(),
            exp: (now + Duration::hours(SESSION_TTL_HOURS)).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign session token: {0}")]
    Signing(String),
    /// Expired, malformed, and mis-signed tokens all land here so callers
    /// cannot tell the cases apart.
    #[error("invalid token")]
    Invalid,
}

/// Mints and verifies HMAC-SHA256 session tokens. Built once from the
/// configured secret and shared by all handlers.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        // Default leeway would accept tokens 60s past expiry.
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a bearer token valid for [`SESSION_TTL_HOURS`].
    pub fn mint(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Decode and verify a bearer value. Every failure mode collapses to
    /// [`TokenError::Invalid`].
    pub fn verify(&self, bearer: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(bearer, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}
