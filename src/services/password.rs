// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing (argon2 with per-hash random salts).
//!
//! Hashing is an explicit step in the register and profile-update flows; no
//! entity lifecycle hook ever touches passwords. Only the PHC-string hash is
//! ever stored.

use crate::error::AppError;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a plaintext password into a PHC string.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored PHC string.
///
/// A mismatch is `Ok(false)`; a stored hash that cannot be parsed is an
/// error, not a mismatch.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored password hash invalid: {}", e)))?;

    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(anyhow::anyhow!(
            "Password verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("test1234").unwrap();
        assert!(verify_password("test1234", &hash).unwrap());
        assert!(!verify_password("test12345", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_salted_and_opaque() {
        let first = hash_password("test1234").unwrap();
        let second = hash_password("test1234").unwrap();

        // Random salts: same password, different hashes
        assert_ne!(first, second);
        // The plaintext never appears in the stored form
        assert!(!first.contains("test1234"));
        assert!(first.starts_with("$argon2"));
    }

    #[test]
    fn test_malformed_stored_hash_is_an_error() {
        assert!(verify_password("test1234", "not-a-phc-string").is_err());
    }
}
