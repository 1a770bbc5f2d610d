/// Postgres-backed stores
///
/// Schema lives in `migrations/`. Refresh tokens are keyed by the SHA-256
/// digest of the bearer value.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::auth::claims::UserId;
use crate::auth::credentials::{CredentialStore, UserIdentity};
use crate::auth::errors::{CredentialError, RefreshTokenError};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::{
    expiry_after, RefreshToken, RefreshTokenRecord, RefreshTokenStore,
};

pub struct PgCredentialStore {
    pool: PgPool,
    hash_cost: u32,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool, hash_cost: u32) -> Self {
        Self { pool, hash_cost }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn verify_credentials(
        &self,
        login: &str,
        password: &str,
    ) -> Result<UserIdentity, CredentialError> {
        let (id, login, display_name, password_hash) =
            sqlx::query_as::<_, (i64, String, String, String)>(
                "SELECT id, login, display_name, password_hash FROM users WHERE login = $1",
            )
            .bind(login)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CredentialError::NoSuchUser)?;

        if !verify_password(password.to_string(), password_hash).await? {
            return Err(CredentialError::BadPassword);
        }

        Ok(UserIdentity {
            id: UserId(id),
            login,
            display_name,
        })
    }

    async fn fetch_by_id(&self, id: UserId) -> Result<UserIdentity, CredentialError> {
        let (id, login, display_name) = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, login, display_name FROM users WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CredentialError::NoSuchUser)?;

        Ok(UserIdentity {
            id: UserId(id),
            login,
            display_name,
        })
    }

    async fn create(
        &self,
        display_name: &str,
        login: &str,
        password: &str,
    ) -> Result<(), CredentialError> {
        let password_hash = hash_password(password.to_string(), self.hash_cost).await?;

        // The UNIQUE constraint on `login` decides duplicates.
        sqlx::query(
            r#"
            INSERT INTO users (login, display_name, password_hash)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(login)
        .bind(display_name)
        .bind(&password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn issue(
        &self,
        subject: UserId,
        ttl: Duration,
    ) -> Result<RefreshTokenRecord, RefreshTokenError> {
        let token = RefreshToken::generate();
        let expires_at = expiry_after(Utc::now(), ttl)?;

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token.hash())
        .bind(subject.0)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(RefreshTokenRecord {
            token,
            subject,
            expires_at,
        })
    }

    async fn lookup(&self, token: &RefreshToken) -> Result<UserId, RefreshTokenError> {
        let user_id = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM refresh_tokens WHERE token_hash = $1 AND expires_at > $2",
        )
        .bind(token.hash())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RefreshTokenError::NotFound)?;

        Ok(UserId(user_id))
    }

    async fn rotate(
        &self,
        old: &RefreshToken,
        subject: UserId,
        ttl: Duration,
    ) -> Result<(RefreshToken, UserId), RefreshTokenError> {
        let new_token = RefreshToken::generate();
        let now = Utc::now();
        let expires_at = expiry_after(now, ttl)?;

        // Single statement: the row lock serializes racing rotations and the
        // loser re-evaluates the WHERE clause against the replaced hash.
        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE refresh_tokens
            SET token_hash = $1, expires_at = $2
            WHERE token_hash = $3 AND user_id = $4 AND expires_at > $5
            RETURNING user_id
            "#,
        )
        .bind(new_token.hash())
        .bind(expires_at)
        .bind(old.hash())
        .bind(subject.0)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RefreshTokenError::NotFound)?;

        Ok((new_token, UserId(user_id)))
    }

    async fn revoke(&self, token: &RefreshToken) -> Result<(), RefreshTokenError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token.hash())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, RefreshTokenError> {
        let now: DateTime<Utc> = Utc::now();
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        tracing::info!(purged = result.rows_affected(), "Expired refresh tokens purged");
        Ok(result.rows_affected())
    }
}
