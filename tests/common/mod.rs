#![allow(dead_code)]

use chrono::Duration;
use reqwest::header::SET_COOKIE;
use std::net::TcpListener;
use std::sync::Arc;
use tokenkeeper::auth::{
    AuthEngine, IdentitySession, InMemoryCredentialStore, InMemoryRefreshTokenStore, JwtSigner,
    MIN_HASH_COST,
};
use tokenkeeper::routes::REFRESH_TOKEN_COOKIE;
use tokenkeeper::startup::run;

pub const TEST_SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";
pub const TEST_ISSUER: &str = "tokenkeeper-test";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub credentials: Arc<InMemoryCredentialStore>,
    pub refresh_tokens: Arc<InMemoryRefreshTokenStore>,
}

/// Wire an engine and session over in-memory stores
pub fn build_session(
    access: Duration,
    refresh: Duration,
) -> (
    Arc<InMemoryCredentialStore>,
    Arc<InMemoryRefreshTokenStore>,
    Arc<IdentitySession>,
) {
    let credentials = Arc::new(InMemoryCredentialStore::new(MIN_HASH_COST));
    let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new());
    let engine = Arc::new(AuthEngine::new(
        refresh_tokens.clone(),
        Arc::new(JwtSigner::new(TEST_SECRET, TEST_ISSUER)),
        refresh,
        access,
    ));
    let session = Arc::new(IdentitySession::new(credentials.clone(), engine));
    (credentials, refresh_tokens, session)
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Duration::seconds(30), Duration::minutes(2)).await
}

pub async fn spawn_app_with(access: Duration, refresh: Duration) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let (credentials, refresh_tokens, session) = build_session(access, refresh);
    let server = run(listener, session).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        client: reqwest::Client::new(),
        credentials,
        refresh_tokens,
    }
}

/// Value of the `refreshToken` cookie set by a response, if any
pub fn refresh_cookie(response: &reqwest::Response) -> Option<String> {
    let prefix = format!("{}=", REFRESH_TOKEN_COOKIE);
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&prefix))
        .map(|value| {
            value[prefix.len()..]
                .split(';')
                .next()
                .unwrap_or_default()
                .to_string()
        })
}

impl TestApp {
    pub async fn register(
        &self,
        full_name: &str,
        login: &str,
        password: &str,
    ) -> reqwest::Response {
        self.client
            .post(&format!("{}/user/register", &self.address))
            .json(&serde_json::json!({
                "fullName": full_name,
                "login": login,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, login: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/user/login", &self.address))
            .json(&serde_json::json!({ "login": login, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/token/refresh", &self.address))
            .header("Cookie", format!("{}={}", REFRESH_TOKEN_COOKIE, refresh_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn revoke(&self, refresh_token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/token/revoke", &self.address))
            .header("Cookie", format!("{}={}", REFRESH_TOKEN_COOKIE, refresh_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn me(&self, access_token: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}/me", &self.address))
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register and log in, returning (access token, refresh token)
    pub async fn signed_in(
        &self,
        full_name: &str,
        login: &str,
        password: &str,
    ) -> (String, String) {
        let registered = self.register(full_name, login, password).await;
        assert_eq!(200, registered.status().as_u16());
        let response = self.login(login, password).await;
        assert_eq!(200, response.status().as_u16());

        let refresh_token = refresh_cookie(&response).expect("No refresh token cookie");
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        let access_token = body["accessToken"]
            .as_str()
            .expect("No access token in response")
            .to_string();

        (access_token, refresh_token)
    }
}
