//! One-way secret hashing.
//!
//! Argon2 with the library's default parameters: deliberately slow, salted
//! per call, cost fixed at build time. Callers on an async runtime should
//! run both functions under `spawn_blocking`; a single derivation takes
//! tens of milliseconds by design.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

use crate::error::{AuthnError, Result};

/// Hash a plaintext secret into a self-describing PHC string suitable for
/// storage. Fails only on internal library failure, never on input shape.
pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AuthnError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a plaintext secret against a stored hash.
///
/// A mismatch is `Ok(false)`, not an error. An error is returned only when
/// `stored` is not a structurally valid hash, which indicates corrupt data
/// rather than a bad login attempt.
pub fn verify_secret(secret: &str, stored: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| AuthnError::Hashing(e.to_string()))?;

    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthnError::Hashing(e.to_string())),
    }
}
