/// Login and registration orchestration
///
/// Registration never issues tokens; a caller logs in separately.

use std::sync::Arc;

use crate::auth::claims::UserId;
use crate::auth::credentials::{CredentialStore, UserIdentity};
use crate::auth::engine::{AuthEngine, SessionTokens};
use crate::auth::errors::{AuthError, CredentialError};

pub struct IdentitySession {
    credentials: Arc<dyn CredentialStore>,
    engine: Arc<AuthEngine>,
}

impl IdentitySession {
    pub fn new(credentials: Arc<dyn CredentialStore>, engine: Arc<AuthEngine>) -> Self {
        Self { credentials, engine }
    }

    pub fn engine(&self) -> &Arc<AuthEngine> {
        &self.engine
    }

    /// Verify credentials and start a session
    ///
    /// # Errors
    /// `AuthError::NoSuchUser` or `AuthError::BadPassword`; no tokens are
    /// minted in either case
    pub async fn login(&self, login: &str, password: &str) -> Result<SessionTokens, AuthError> {
        let user = self
            .credentials
            .verify_credentials(login, password)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Login rejected");
                AuthError::from(e)
            })?;

        self.engine.issue_session_tokens(user.id).await
    }

    /// Create a new user
    ///
    /// # Errors
    /// `AuthError::AlreadyExists` if `login` is taken
    pub async fn register(
        &self,
        display_name: &str,
        login: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        self.credentials.create(display_name, login, password).await?;
        tracing::info!(login = %login, "User registered");
        Ok(())
    }

    /// Identity behind a verified access token subject
    ///
    /// # Errors
    /// `AuthError::Invalid` if the subject no longer exists: the token is
    /// well signed but no longer names anyone
    pub async fn current_user(&self, subject: UserId) -> Result<UserIdentity, AuthError> {
        match self.credentials.fetch_by_id(subject).await {
            Ok(identity) => Ok(identity),
            Err(CredentialError::NoSuchUser) => {
                tracing::warn!(user_id = %subject, "Access token subject no longer exists");
                Err(AuthError::Invalid)
            }
            Err(e) => Err(e.into()),
        }
    }
}
