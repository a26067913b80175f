//! Argon2 password hashing

use argon2::{
    Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier, password_hash::SaltString,
};

use super::{IdentityError, IdentityResult};

/// Hashes and verifies passwords as PHC strings
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a password with a fresh salt
    pub fn hash(&self, password: &str) -> IdentityResult<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| IdentityError::Hashing(e.to_string()))?
            .to_string();

        Ok(hash)
    }

    /// Verify a password against a stored hash
    pub fn verify(&self, password_hash: &str, password: &str) -> IdentityResult<bool> {
        let parsed_hash =
            PasswordHash::new(password_hash).map_err(|e| IdentityError::Hashing(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
