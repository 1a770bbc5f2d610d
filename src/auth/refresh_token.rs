/// Refresh Token Management
///
/// Refresh tokens are:
/// - 48 cryptographically random bytes, URL-safe base64 encoded (64 chars)
/// - Stored only as their SHA-256 hex digest, never in plaintext
/// - Single-use: every successful rotation replaces the stored value
/// - Deleted outright on revocation

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::auth::claims::UserId;
use crate::auth::errors::RefreshTokenError;

pub const TOKEN_BYTE_LENGTH: usize = 48;
pub const TOKEN_STRING_LENGTH: usize = TOKEN_BYTE_LENGTH / 3 * 4;

/// Opaque bearer value of a refresh token
///
/// `Debug` is redacted so the secret never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Generate a new cryptographically secure refresh token
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTE_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(general_purpose::URL_SAFE.encode(bytes))
    }

    /// Structural check of a presented token before any store round-trip
    ///
    /// # Errors
    /// Returns `RefreshTokenError::Malformed` if the length or alphabet is
    /// wrong
    pub fn parse(raw: &str) -> Result<Self, RefreshTokenError> {
        let well_formed = raw.len() == TOKEN_STRING_LENGTH
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(RefreshTokenError::Malformed)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SHA-256 hex digest used as the storage key
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(..)")
    }
}

/// A persisted refresh token bound to its subject
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub token: RefreshToken,
    pub subject: UserId,
    pub expires_at: DateTime<Utc>,
}

/// Expiry instant `ttl` after `now`
///
/// # Errors
/// Returns `RefreshTokenError::Storage` if the instant is outside the range
/// chrono can represent
pub fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, RefreshTokenError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| RefreshTokenError::Storage("refresh token expiry out of range".to_string()))
}

/// Persistence of refresh tokens with atomic rotation and revocation
///
/// Records past `expires_at` must behave as if they did not exist.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist a freshly generated token for `subject` expiring after `ttl`
    async fn issue(
        &self,
        subject: UserId,
        ttl: Duration,
    ) -> Result<RefreshTokenRecord, RefreshTokenError>;

    /// Subject of the live record for `token`, without changing anything
    async fn lookup(&self, token: &RefreshToken) -> Result<UserId, RefreshTokenError>;

    /// Consume `old` and replace it with a new token in one atomic step
    ///
    /// Only a live record still bound to `subject` is replaced. Returns the
    /// new token and the subject of the chain. Of two concurrent rotations of
    /// the same token at most one succeeds; the other gets
    /// `RefreshTokenError::NotFound`.
    async fn rotate(
        &self,
        old: &RefreshToken,
        subject: UserId,
        ttl: Duration,
    ) -> Result<(RefreshToken, UserId), RefreshTokenError>;

    /// Delete the record for `token`; a missing record is not an error
    async fn revoke(&self, token: &RefreshToken) -> Result<(), RefreshTokenError>;

    /// Delete every expired record, returning how many were removed
    async fn purge_expired(&self) -> Result<u64, RefreshTokenError>;
}
