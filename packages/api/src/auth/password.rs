//! # Password hashing and verification — Argon2id
//!
//! - [`hash_password`] — generates a random salt via [`OsRng`], hashes the plaintext
//!   with the default Argon2id parameters, and returns a PHC-format string
//!   (e.g. `$argon2id$v=19$m=19456,t=2,p=1$...`). This is what the `password_hash`
//!   column of the `users` table holds; the plaintext is never stored.
//!
//! - [`verify_password`] — parses a PHC-format hash and checks the plaintext against
//!   it. `Ok(true)` on match, `Ok(false)` on mismatch, `Err` if the stored hash is
//!   malformed.
//!
//! Both are CPU-bound; handlers run them through [`hash_blocking`] and
//! [`verify_blocking`] so the async workers stay free.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use tokio::sync::OnceCell;

use crate::error::{ApiError, ApiResult};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn hash_blocking(password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

pub async fn verify_blocking(password: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

/// Hash checked when the login email is unknown, so that branch costs one
/// Argon2 verification like a wrong password does.
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

/// Verify `password` against [`DUMMY_HASH`] and discard the result.
pub async fn verify_dummy(password: String) -> ApiResult<()> {
    let hash = DUMMY_HASH
        .get_or_try_init(|| hash_blocking("roomus unknown account".to_string()))
        .await?;
    verify_blocking(password, hash.clone()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(
            hash_password("same password").unwrap(),
            hash_password("same password").unwrap()
        );
    }

    #[tokio::test]
    async fn test_dummy_verification_uses_a_real_hash() {
        verify_dummy("whatever".to_string()).await.unwrap();
        let hash = DUMMY_HASH.get().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!verify_password("whatever", hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("anything", "plaintext-from-an-old-db").is_err());
    }
}
