/// In-memory stores
///
/// Process-local implementations of the store traits. Every mutation happens
/// under a single mutex, which gives the same per-token and per-login
/// atomicity the Postgres stores get from row locks and constraints.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::auth::claims::UserId;
use crate::auth::credentials::{CredentialStore, UserIdentity};
use crate::auth::errors::{CredentialError, RefreshTokenError};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::{
    expiry_after, RefreshToken, RefreshTokenRecord, RefreshTokenStore,
};

struct StoredUser {
    id: UserId,
    display_name: String,
    password_hash: String,
}

#[derive(Default)]
struct Users {
    by_login: HashMap<String, StoredUser>,
    next_id: i64,
}

pub struct InMemoryCredentialStore {
    users: Mutex<Users>,
    hash_cost: u32,
}

impl InMemoryCredentialStore {
    pub fn new(hash_cost: u32) -> Self {
        Self {
            users: Mutex::new(Users::default()),
            hash_cost,
        }
    }

    /// Number of registered users
    pub fn len(&self) -> usize {
        self.lock().map(|users| users.by_login.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Users>, CredentialError> {
        self.users
            .lock()
            .map_err(|_| CredentialError::Storage("user table lock poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn verify_credentials(
        &self,
        login: &str,
        password: &str,
    ) -> Result<UserIdentity, CredentialError> {
        let (identity, password_hash) = {
            let users = self.lock()?;
            let user = users.by_login.get(login).ok_or(CredentialError::NoSuchUser)?;
            (
                UserIdentity {
                    id: user.id,
                    login: login.to_string(),
                    display_name: user.display_name.clone(),
                },
                user.password_hash.clone(),
            )
        };

        if !verify_password(password.to_string(), password_hash).await? {
            return Err(CredentialError::BadPassword);
        }

        Ok(identity)
    }

    async fn fetch_by_id(&self, id: UserId) -> Result<UserIdentity, CredentialError> {
        let users = self.lock()?;
        users
            .by_login
            .iter()
            .find(|(_, user)| user.id == id)
            .map(|(login, user)| UserIdentity {
                id: user.id,
                login: login.clone(),
                display_name: user.display_name.clone(),
            })
            .ok_or(CredentialError::NoSuchUser)
    }

    async fn create(
        &self,
        display_name: &str,
        login: &str,
        password: &str,
    ) -> Result<(), CredentialError> {
        let password_hash = hash_password(password.to_string(), self.hash_cost).await?;

        let mut users = self.lock()?;
        if users.by_login.contains_key(login) {
            return Err(CredentialError::AlreadyExists);
        }
        users.next_id += 1;
        let id = UserId(users.next_id);
        users.by_login.insert(
            login.to_string(),
            StoredUser {
                id,
                display_name: display_name.to_string(),
                password_hash,
            },
        );

        Ok(())
    }
}

struct StoredToken {
    subject: UserId,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    records: Mutex<HashMap<String, StoredToken>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, expired ones included
    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, StoredToken>>, RefreshTokenError> {
        self.records
            .lock()
            .map_err(|_| {
                RefreshTokenError::Storage("refresh token table lock poisoned".to_string())
            })
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn issue(
        &self,
        subject: UserId,
        ttl: Duration,
    ) -> Result<RefreshTokenRecord, RefreshTokenError> {
        let token = RefreshToken::generate();
        let expires_at = expiry_after(Utc::now(), ttl)?;

        self.lock()?.insert(token.hash(), StoredToken { subject, expires_at });

        Ok(RefreshTokenRecord {
            token,
            subject,
            expires_at,
        })
    }

    async fn lookup(&self, token: &RefreshToken) -> Result<UserId, RefreshTokenError> {
        let now = Utc::now();
        self.lock()?
            .get(&token.hash())
            .filter(|stored| stored.expires_at > now)
            .map(|stored| stored.subject)
            .ok_or(RefreshTokenError::NotFound)
    }

    async fn rotate(
        &self,
        old: &RefreshToken,
        subject: UserId,
        ttl: Duration,
    ) -> Result<(RefreshToken, UserId), RefreshTokenError> {
        let now = Utc::now();
        let expires_at = expiry_after(now, ttl)?;
        let old_hash = old.hash();
        let mut records = self.lock()?;

        let live = records
            .get(&old_hash)
            .is_some_and(|stored| stored.subject == subject && stored.expires_at > now);
        if !live {
            return Err(RefreshTokenError::NotFound);
        }
        records.remove(&old_hash);

        let new_token = RefreshToken::generate();
        records.insert(new_token.hash(), StoredToken { subject, expires_at });

        Ok((new_token, subject))
    }

    async fn revoke(&self, token: &RefreshToken) -> Result<(), RefreshTokenError> {
        self.lock()?.remove(&token.hash());
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, RefreshTokenError> {
        let now = Utc::now();
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|_, stored| stored.expires_at > now);
        Ok((before - records.len()) as u64)
    }
}
