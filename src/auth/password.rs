/// Password Hashing and Verification
///
/// bcrypt hashing for stored credentials. Hashing is CPU-bound, so both
/// operations run on the blocking thread pool.

use bcrypt::{hash, verify};

use crate::auth::errors::CredentialError;

/// Lowest bcrypt cost accepted by the hasher (useful for tests)
pub const MIN_HASH_COST: u32 = 4;
/// Highest bcrypt cost accepted by the hasher
pub const MAX_HASH_COST: u32 = 31;

/// Hash a password using bcrypt with the given cost
///
/// # Errors
/// Returns `CredentialError::Hashing` if bcrypt fails or the cost is out of
/// range
pub async fn hash_password(password: String, cost: u32) -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| CredentialError::Hashing(e.to_string()))?
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}

/// Verify a password against its bcrypt hash
///
/// # Errors
/// Returns `CredentialError::Hashing` if the stored hash cannot be parsed
pub async fn verify_password(
    password: String,
    password_hash: String,
) -> Result<bool, CredentialError> {
    tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| CredentialError::Hashing(e.to_string()))?
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}
