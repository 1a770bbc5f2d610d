/// Access Token Signing and Verification
///
/// Creates and verifies HS256 JWTs carrying the subject and expiry of an
/// access token.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::claims::AccessTokenClaims;
use crate::auth::errors::TokenError;
use crate::configuration::JwtSettings;

/// Creates and verifies self-contained access tokens
pub trait Signer: Send + Sync {
    /// Sign `claims` into an opaque token string
    fn create(&self, claims: &AccessTokenClaims) -> Result<String, TokenError>;

    /// Verify a token string and return its claims
    ///
    /// # Errors
    /// - `TokenError::Expired` if the signature is good but `exp` has passed
    /// - `TokenError::Invalid` for every other failure
    fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError>;
}

/// JWT payload: the access token claims plus the issuer of this signer
#[derive(Serialize, Deserialize)]
struct SignedClaims {
    #[serde(flatten)]
    claims: AccessTokenClaims,
    iss: String,
}

/// HMAC-SHA-256 JWT signer backed by a process-wide secret
pub struct JwtSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
}

impl JwtSigner {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&issuer]);
        // Expiry is checked after decoding so it can be reported separately.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer,
        }
    }

    pub fn from_settings(config: &JwtSettings) -> Self {
        Self::new(config.secret.as_bytes(), config.issuer.clone())
    }
}

impl Signer for JwtSigner {
    fn create(&self, claims: &AccessTokenClaims) -> Result<String, TokenError> {
        let payload = SignedClaims {
            claims: claims.clone(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        let claims = decode::<SignedClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation error: {}", e);
                TokenError::Invalid
            })?;

        let now = Utc::now().timestamp();
        if now < claims.iat {
            tracing::debug!(iat = claims.iat, "JWT issued in the future");
            return Err(TokenError::Invalid);
        }
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
