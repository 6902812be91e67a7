//! Password hashing and verification using Argon2
//!
//! Uses the argon2id variant. The default cost (64 MiB, 3 passes) takes on the
//! order of 100ms per hash on commodity hardware. Hashing runs on the blocking
//! thread pool so it never stalls the async runtime.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::types::AuditError;

/// Memory cost in KiB for production hashing
pub const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;
/// Number of passes for production hashing
pub const DEFAULT_ITERATIONS: u32 = 3;
/// Minimum accepted password length at registration
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// One-way salted credential hasher
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        let params = Params::new(DEFAULT_MEMORY_KIB, DEFAULT_ITERATIONS, 1, None)
            .unwrap_or_default();
        Self { params }
    }
}

impl CredentialHasher {
    /// Hasher with an explicit work factor
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, AuditError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AuditError::Config(format!("Invalid argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password. Returns the PHC-formatted string (salt and
    /// parameters included).
    pub fn hash_sync(&self, password: &str) -> Result<String, AuditError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuditError::Internal(format!("Failed to hash password: {e}")))
    }

    /// Hash a password on the blocking pool
    pub async fn hash(&self, password: &str) -> Result<String, AuditError> {
        let hasher = self.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash_sync(&password)).await?
    }

    /// Verify a password on the blocking pool
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, AuditError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?
    }
}

/// Verify a password against a stored hash.
///
/// Parameters are read from the hash itself, so hashes produced under an
/// older work factor keep verifying.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuditError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuditError::Internal(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
