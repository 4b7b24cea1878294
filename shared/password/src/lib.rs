//! Memory-hard password hashing (Argon2id) with embedded salt and
//! constant-time verification.

use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::rngs::OsRng;

#[derive(Debug, Clone, Copy)]
pub struct HashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self { memory_kib: 19_456, iterations: 2, parallelism: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordError {
    /// The hash params were invalid (e.g. memory below the Argon2 minimum).
    InvalidParams,
    /// Hashing failed (out-of-memory, RNG failure).
    HashFailure,
    /// The stored hash blob is not a well-formed PHC string.
    MalformedHash,
}

fn build_argon2(params: HashParams) -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
        .map_err(|_| PasswordError::InvalidParams)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a plaintext password into a self-describing PHC string (algorithm,
/// params, salt, and digest all embedded — no separate salt column needed).
pub fn hash(password: &str, params: HashParams) -> Result<String, PasswordError> {
    let argon2 = build_argon2(params)?;
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| PasswordError::HashFailure)
}

/// Verify a plaintext password against a stored PHC hash string in constant
/// time. The hash's own embedded params are used, so this is stable across
/// `HashParams` tuning changes.
pub fn verify(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| PasswordError::MalformedHash)?;
    let argon2 = Argon2::default();
    Ok(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
}
