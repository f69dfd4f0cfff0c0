use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthError;
use crate::clock::SharedClock;
use crate::config::{AppConfig, ConfigError};
use crate::types::{Principal, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued to
    pub sub: String,
    pub principal_id: i64,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Generation(String),
}

/// Issues and verifies stateless session tokens.
///
/// The secret and algorithm are fixed at construction. Tokens cannot be revoked;
/// their lifetime is decided once, at issuance.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    default_ttl: Duration,
    clock: SharedClock,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], algorithm: Algorithm, default_ttl: Duration, clock: SharedClock) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            default_ttl,
            clock,
        }
    }

    pub fn from_config(config: &AppConfig, clock: SharedClock) -> Result<Self, ConfigError> {
        config.validate()?;
        let algorithm = config.signing_algorithm()?;
        let default_ttl = Duration::minutes(config.security.token_default_ttl_minutes as i64);
        Ok(Self::new(config.security.jwt_secret.as_bytes(), algorithm, default_ttl, clock))
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Sign a token for `principal`, valid for `ttl` (or the service default).
    ///
    /// `iat` and `exp` are whole seconds truncated from the clock, so a token can expire
    /// up to one second before `now + ttl`.
    pub fn issue(&self, principal: &Principal, ttl: Option<Duration>) -> Result<String, TokenError> {
        let now = self.clock.now();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let claims = Claims {
            sub: principal.username.clone(),
            principal_id: principal.id,
            role: principal.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Decode and check a token. Every failure is a rejection, never a panic.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below against the injected clock
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!("Token rejected: {:?}", e.kind());
                AuthError::TokenMalformed
            })?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::TokenMalformed);
        }

        if self.clock.now().timestamp() >= claims.exp {
            tracing::debug!("Token for '{}' expired at {}", claims.sub, claims.exp);
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}
