/// Token lifecycle engine
///
/// A refresh-token chain moves `Active --rotate--> Active'`,
/// `Active --revoke--> Gone` or `Active --expire--> Gone`; nothing leaves
/// `Gone`. The engine itself holds only immutable configuration, all state
/// lives in the refresh token store.

use chrono::Duration;
use std::sync::Arc;

use crate::auth::claims::{AccessTokenClaims, UserId};
use crate::auth::errors::AuthError;
use crate::auth::jwt::Signer;
use crate::auth::refresh_token::{RefreshToken, RefreshTokenStore};

/// Access/refresh pair handed to a caller
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

pub struct AuthEngine {
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    signer: Arc<dyn Signer>,
    refresh_token_lifetime: Duration,
    access_token_lifetime: Duration,
}

impl AuthEngine {
    pub fn new(
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        signer: Arc<dyn Signer>,
        refresh_token_lifetime: Duration,
        access_token_lifetime: Duration,
    ) -> Self {
        Self {
            refresh_tokens,
            signer,
            refresh_token_lifetime,
            access_token_lifetime,
        }
    }

    pub fn access_token_expiry_secs(&self) -> i64 {
        self.access_token_lifetime.num_seconds()
    }

    pub fn refresh_token_expiry_secs(&self) -> i64 {
        self.refresh_token_lifetime.num_seconds()
    }

    /// Start a new refresh-token chain for an already authenticated subject
    pub async fn issue_session_tokens(&self, subject: UserId) -> Result<SessionTokens, AuthError> {
        let record = self
            .refresh_tokens
            .issue(subject, self.refresh_token_lifetime)
            .await?;

        let access_token = match self.mint_access_token(subject) {
            Ok(access_token) => access_token,
            Err(e) => {
                // A half-issued pair must not leave a usable refresh token.
                if let Err(revoke_error) = self.refresh_tokens.revoke(&record.token).await {
                    tracing::error!(error = %revoke_error, "Failed to discard unsigned session");
                }
                return Err(e);
            }
        };

        tracing::info!(user_id = %subject, "Session tokens issued");

        Ok(SessionTokens {
            access_token,
            refresh_token: record.token,
        })
    }

    /// Exchange a refresh token for a new pair
    ///
    /// The access token is signed before the store commits the rotation, so
    /// a failed call leaves the presented token usable.
    ///
    /// # Errors
    /// `AuthError::InvalidToken` whether the token was malformed, never
    /// existed, expired or was already rotated or revoked
    pub async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, AuthError> {
        let old = RefreshToken::parse(refresh_token)?;
        let subject = self
            .refresh_tokens
            .lookup(&old)
            .await
            .map_err(|e| Self::rejected(e.into()))?;

        let access_token = self.mint_access_token(subject)?;

        // A concurrent rotation may have won since the lookup; the minted
        // access token is then dropped.
        let (new_token, subject) = self
            .refresh_tokens
            .rotate(&old, subject, self.refresh_token_lifetime)
            .await
            .map_err(|e| Self::rejected(e.into()))?;

        tracing::info!(user_id = %subject, "Refresh token rotated");

        Ok(SessionTokens {
            access_token,
            refresh_token: new_token,
        })
    }

    fn rejected(error: AuthError) -> AuthError {
        tracing::warn!(error = %error, "Refresh token rejected");
        error
    }

    /// End a refresh-token chain
    ///
    /// Malformed or unknown tokens are already unusable, so they are accepted
    /// silently.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        let token = match RefreshToken::parse(refresh_token) {
            Ok(token) => token,
            Err(_) => {
                tracing::debug!("Ignoring revocation of malformed refresh token");
                return Ok(());
            }
        };

        self.refresh_tokens.revoke(&token).await?;
        tracing::info!("Refresh token revoked");
        Ok(())
    }

    /// Resolve the subject of an access token
    ///
    /// # Errors
    /// `AuthError::Expired` when the caller should refresh, `AuthError::Invalid`
    /// for anything forged or malformed
    pub fn identity_from_access_token(&self, access_token: &str) -> Result<UserId, AuthError> {
        let claims = self.signer.verify(access_token)?;
        Ok(claims.subject()?)
    }

    fn mint_access_token(&self, subject: UserId) -> Result<String, AuthError> {
        let claims = AccessTokenClaims::new(subject, self.access_token_lifetime);
        Ok(self.signer.create(&claims)?)
    }
}
