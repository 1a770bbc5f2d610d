/// User credentials
///
/// The identity record handed to callers never carries the password hash;
/// stores keep the hash in their own row types.

use async_trait::async_trait;
use serde::Serialize;

use crate::auth::claims::UserId;
use crate::auth::errors::CredentialError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub login: String,
    pub display_name: String,
}

/// Persistence of user records and password verification
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up `login` and check `password` against its stored hash
    async fn verify_credentials(
        &self,
        login: &str,
        password: &str,
    ) -> Result<UserIdentity, CredentialError>;

    async fn fetch_by_id(&self, id: UserId) -> Result<UserIdentity, CredentialError>;

    /// Hash `password` and persist a new user
    ///
    /// Duplicate logins are rejected with `CredentialError::AlreadyExists` by
    /// the store's own uniqueness guarantee.
    async fn create(
        &self,
        display_name: &str,
        login: &str,
        password: &str,
    ) -> Result<(), CredentialError>;
}
