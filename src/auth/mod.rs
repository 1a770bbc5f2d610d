/// Authentication module
///
/// Credential verification, access token signing, refresh token rotation and
/// the engine tying them together.

mod claims;
mod credentials;
mod engine;
mod errors;
mod jwt;
mod memory;
mod password;
mod postgres;
mod refresh_token;
mod session;

pub use claims::{AccessTokenClaims, UserId};
pub use credentials::{CredentialStore, UserIdentity};
pub use engine::{AuthEngine, SessionTokens};
pub use errors::{AuthError, CredentialError, RefreshTokenError, TokenError};
pub use jwt::{JwtSigner, Signer};
pub use memory::{InMemoryCredentialStore, InMemoryRefreshTokenStore};
pub use password::{hash_password, verify_password, MAX_HASH_COST, MIN_HASH_COST};
pub use postgres::{PgCredentialStore, PgRefreshTokenStore};
pub use refresh_token::{
    RefreshToken, RefreshTokenRecord, RefreshTokenStore, TOKEN_BYTE_LENGTH, TOKEN_STRING_LENGTH,
};
pub use session::IdentitySession;
