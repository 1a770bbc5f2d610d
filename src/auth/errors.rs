//! Error types for the token lifecycle engine and its collaborators.
//!
//! Each collaborator reports its own failures; [`AuthError`] is the single
//! classification the engine and the identity session hand back to callers.

use thiserror::Error;

/// Failures reported by a [`Signer`](crate::auth::Signer).
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("access token has expired")]
    Expired,

    #[error("access token is invalid")]
    Invalid,

    #[error("failed to sign access token: {0}")]
    Signing(String),
}

/// Failures reported by a [`CredentialStore`](crate::auth::CredentialStore).
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no such user")]
    NoSuchUser,

    #[error("password does not match")]
    BadPassword,

    #[error("login is already taken")]
    AlreadyExists,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("credential storage failure: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for CredentialError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => CredentialError::AlreadyExists,
            _ => CredentialError::Storage(err.to_string()),
        }
    }
}

/// Failures reported by a [`RefreshTokenStore`](crate::auth::RefreshTokenStore).
#[derive(Debug, Error)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,

    #[error("refresh token is malformed")]
    Malformed,

    #[error("refresh token storage failure: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for RefreshTokenError {
    fn from(err: sqlx::Error) -> Self {
        RefreshTokenError::Storage(err.to_string())
    }
}

/// Outcome classes surfaced by the engine and the identity session.
///
/// `Internal` keeps the underlying cause for logs only; it is never echoed
/// back to a caller.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no such user")]
    NoSuchUser,

    #[error("bad password")]
    BadPassword,

    #[error("user already exists")]
    AlreadyExists,

    #[error("refresh token is no longer valid")]
    InvalidToken,

    #[error("access token has expired")]
    Expired,

    #[error("access token is invalid")]
    Invalid,

    #[error("internal failure: {0}")]
    Internal(String),
}

impl AuthError {
    /// True for the two credential failures that must look identical to a
    /// caller.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, AuthError::NoSuchUser | AuthError::BadPassword)
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::Expired,
            TokenError::Invalid => AuthError::Invalid,
            TokenError::Signing(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<CredentialError> for AuthError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::NoSuchUser => AuthError::NoSuchUser,
            CredentialError::BadPassword => AuthError::BadPassword,
            CredentialError::AlreadyExists => AuthError::AlreadyExists,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<RefreshTokenError> for AuthError {
    fn from(err: RefreshTokenError) -> Self {
        match err {
            RefreshTokenError::NotFound | RefreshTokenError::Malformed => AuthError::InvalidToken,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_failures_collapse_to_invalid_token() {
        assert!(matches!(
            AuthError::from(RefreshTokenError::NotFound),
            AuthError::InvalidToken
        ));
        assert!(matches!(
            AuthError::from(RefreshTokenError::Malformed),
            AuthError::InvalidToken
        ));
        assert!(matches!(
            AuthError::from(RefreshTokenError::Storage("down".to_string())),
            AuthError::Internal(_)
        ));
    }

    #[test]
    fn test_expired_stays_distinct_from_invalid() {
        assert!(matches!(AuthError::from(TokenError::Expired), AuthError::Expired));
        assert!(matches!(AuthError::from(TokenError::Invalid), AuthError::Invalid));
    }

    #[test]
    fn test_credential_failures_are_grouped() {
        assert!(AuthError::from(CredentialError::NoSuchUser).is_invalid_credentials());
        assert!(AuthError::from(CredentialError::BadPassword).is_invalid_credentials());
        assert!(!AuthError::from(CredentialError::AlreadyExists).is_invalid_credentials());
        assert!(matches!(
            AuthError::from(CredentialError::Hashing("boom".to_string())),
            AuthError::Internal(_)
        ));
    }
}
