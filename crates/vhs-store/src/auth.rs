//! Upload token resolution.
//!
//! Tokens are HS256 JWTs whose `sub` claim is the user id.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use vhs_models::UserId;

use crate::error::{StoreError, StoreResult};

/// Claims carried by an upload token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID
    pub sub: String,
    /// Expiration (unix seconds)
    pub exp: i64,
    /// Issued at
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Verifies tokens against a shared secret.
#[derive(Clone)]
pub struct JwtTokenResolver {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtTokenResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenResolver").finish_non_exhaustive()
    }
}

impl JwtTokenResolver {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Resolve a token to the user it was issued for.
    pub fn resolve(&self, token: &str) -> StoreResult<UserId> {
        let data = decode::<TokenClaims>(token, &self.key, &self.validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => StoreError::TokenExpired,
                _ => StoreError::InvalidToken(e.to_string()),
            }
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(StoreError::auth("token has no subject"));
        }

        Ok(UserId::new(data.claims.sub))
    }
}

/// Issue a token for `user`, valid for `ttl`.
pub fn issue_token(user: &UserId, secret: &str, ttl: Duration) -> StoreResult<String> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user.as_str().to_string(),
        exp: (now + ttl).timestamp(),
        iat: Some(now.timestamp()),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| StoreError::InvalidToken(e.to_string()))
}
