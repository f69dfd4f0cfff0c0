//! Password hashing and verification.
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use std::sync::Arc;
use thiserror::Error;

use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid password hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Password hashing worker failed: {0}")]
    Worker(String),
}

/// Argon2id hasher; every hash embeds its own random salt and parameters
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    params: Params,
    /// Hash of a random secret, checked when the username is unknown so both
    /// login failures cost one verification
    dummy_hash: Arc<str>,
}

impl CredentialVerifier {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        let mut verifier = Self {
            params,
            dummy_hash: Arc::from(""),
        };
        let secret = SaltString::generate(&mut OsRng);
        verifier.dummy_hash = Arc::from(verifier.hash(secret.as_str())?);
        Ok(verifier)
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, PasswordError> {
        Self::new(security.password_hash_memory_kib, security.password_hash_iterations)
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check a password against a stored hash. Malformed hashes never match.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        self.hasher()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }

    pub fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }

    /// `hash` on the blocking pool so request tasks are not stalled
    pub async fn hash_offloaded(&self, plaintext: String) -> Result<String, PasswordError> {
        let verifier = self.clone();
        tokio::task::spawn_blocking(move || verifier.hash(&plaintext))
            .await
            .map_err(|e| PasswordError::Worker(e.to_string()))?
    }

    /// `verify` on the blocking pool; a failed worker counts as a mismatch
    pub async fn verify_offloaded(&self, plaintext: String, hash: String) -> bool {
        let verifier = self.clone();
        match tokio::task::spawn_blocking(move || verifier.verify(&plaintext, &hash)).await {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!("Password verification worker failed: {}", e);
                false
            }
        }
    }
}
