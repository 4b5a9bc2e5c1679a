// Password hashing and verification service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use std::sync::OnceLock;

use crate::auth::error::AuthError;

/// Hash checked when the username is unknown, so that path costs a full verification too
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Password service for hashing and verification
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id with default parameters and a fresh random salt
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                tracing::error!("Argon2 hashing failed: {}", e);
                AuthError::PasswordHashError
            })
    }

    /// Verify a password against a stored PHC hash
    ///
    /// Returns `Ok(false)` on mismatch; a stored hash that cannot be parsed is an error.
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            tracing::error!("Stored password hash is malformed: {}", e);
            AuthError::PasswordHashError
        })?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                tracing::error!("Argon2 verification failed: {}", e);
                Err(AuthError::PasswordHashError)
            }
        }
    }

    /// Run a verification whose result is discarded. Used when no user matches,
    /// so an unknown username takes as long to reject as a wrong password.
    pub fn verify_dummy(password: &str) {
        let dummy = DUMMY_HASH.get_or_init(|| Self::hash_password("book-api-dummy-password").ok());
        if let Some(hash) = dummy {
            let _ = Self::verify_password(password, hash);
        }
    }
}
