/// Access token claims
///
/// Represents the payload of a signed access token: who it is for and the
/// window `[iat, exp)` during which it is valid (RFC 7519 claim names).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::errors::TokenError;

/// Numeric identifier of a registered user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Claims carried by an access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessTokenClaims {
    /// Subject (user ID as decimal string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp, exclusive)
    pub exp: i64,
}

impl AccessTokenClaims {
    /// Create claims for `subject` valid for `lifetime` starting now
    pub fn new(subject: UserId, lifetime: Duration) -> Self {
        Self::issued_at(subject, Utc::now(), lifetime)
    }

    /// Create claims for `subject` issued at an explicit instant
    pub fn issued_at(subject: UserId, issued_at: DateTime<Utc>, lifetime: Duration) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: subject.to_string(),
            iat,
            exp: iat + lifetime.num_seconds(),
        }
    }

    /// Extract the subject
    ///
    /// # Errors
    /// Returns `TokenError::Invalid` if `sub` is not a numeric user ID
    pub fn subject(&self) -> Result<UserId, TokenError> {
        self.sub
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| TokenError::Invalid)
    }

    /// Check whether `now` falls at or past the expiry instant
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}
