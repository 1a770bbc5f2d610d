use chrono::Duration;

use crate::auth::{MAX_HASH_COST, MIN_HASH_COST};
use crate::error::ConfigError;

/// Longest accepted token lifetime: ten years, in seconds
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Token signing and lifetime settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 30)
    pub refresh_token_expiry: i64,  // seconds (e.g., 120)
    pub issuer: String,
    #[serde(default = "default_hash_cost")]
    pub password_hash_cost: u32,
}

fn default_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl JwtSettings {
    pub fn access_token_lifetime(&self) -> Duration {
        Duration::seconds(self.access_token_expiry)
    }

    pub fn refresh_token_lifetime(&self) -> Duration {
        Duration::seconds(self.refresh_token_expiry)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        for (name, secs) in [
            ("jwt.access_token_expiry", self.access_token_expiry),
            ("jwt.refresh_token_expiry", self.refresh_token_expiry),
        ] {
            if secs <= 0 || secs > MAX_TOKEN_LIFETIME_SECS {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be between 1 and {} seconds",
                    name, MAX_TOKEN_LIFETIME_SECS
                )));
            }
        }
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&self.password_hash_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.password_hash_cost must be between {} and {}",
                MIN_HASH_COST, MAX_HASH_COST
            )));
        }
        Ok(())
    }
}

/// Load settings from the optional `configuration` file, then `APP_*`
/// environment variables (`APP_JWT__SECRET`, `APP_APPLICATION__PORT`, ...).
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 30,
            refresh_token_expiry: 120,
            issuer: "test".to_string(),
            password_hash_cost: MIN_HASH_COST,
        }
    }

    #[test]
    fn test_lifetimes_are_whole_seconds() {
        let settings = jwt_settings();
        assert_eq!(settings.access_token_lifetime().num_seconds(), 30);
        assert_eq!(settings.refresh_token_lifetime().num_seconds(), 120);
    }

    #[test]
    fn test_valid_settings() {
        assert!(jwt_settings().validate().is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut settings = jwt_settings();
        settings.secret = "   ".to_string();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_non_positive_lifetime_rejected() {
        let mut settings = jwt_settings();
        settings.access_token_expiry = 0;
        assert!(settings.validate().is_err());

        let mut settings = jwt_settings();
        settings.refresh_token_expiry = -5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_oversized_lifetime_rejected() {
        let mut settings = jwt_settings();
        settings.refresh_token_expiry = 10_000_000_000_000;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue(_))
        ));

        let mut settings = jwt_settings();
        settings.access_token_expiry = MAX_TOKEN_LIFETIME_SECS + 1;
        assert!(settings.validate().is_err());

        let mut settings = jwt_settings();
        settings.refresh_token_expiry = MAX_TOKEN_LIFETIME_SECS;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_hash_cost_out_of_range_rejected() {
        let mut settings = jwt_settings();
        settings.password_hash_cost = 2;
        assert!(settings.validate().is_err());
    }
}
