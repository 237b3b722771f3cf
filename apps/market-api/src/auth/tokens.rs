//! Bearer token verification (HS256 JWT carrying `{userId, role}`).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use market_common::Role;
use serde::{Deserialize, Serialize};

use crate::auth::principal::Principal;
use crate::error::ApiError;

/// Default lifetime of tokens minted by [`TokenVerifier::mint`].
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 3600;

/// Claims carried by a platform token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verifies (and, for tooling and tests, mints) platform tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Decode and verify a token, returning the principal it names.
    ///
    /// Fails on a bad signature, an expired token, or an unknown role.
    pub fn verify(&self, token: &str) -> Result<Principal, ApiError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(?e, "token validation failed");
                ApiError::unauthorized("Invalid or expired token")
            })?;

        let role: Role = data.claims.role.parse().map_err(|e: String| {
            tracing::debug!(error = %e, "token carries unknown role");
            ApiError::unauthorized("Invalid token role")
        })?;

        Ok(Principal::new(data.claims.user_id, role))
    }

    /// Sign a token for `principal` valid for `ttl`.
    pub fn mint(&self, principal: &Principal, ttl: Duration) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: principal.user_id().to_string(),
            role: principal.role().as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(
            |e| {
                tracing::error!(?e, "failed to sign token");
                ApiError::internal("Token signing failed")
            },
        )
    }
}
