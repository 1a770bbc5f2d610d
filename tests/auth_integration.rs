mod common;

use chrono::Duration;
use common::{refresh_cookie, spawn_app, spawn_app_with, TEST_ISSUER, TEST_SECRET};
use serde_json::{json, Value};
use tokenkeeper::auth::{AccessTokenClaims, JwtSigner, Signer, UserId};

// --- Registration Tests ---

#[tokio::test]
async fn register_returns_200_for_valid_input() {
    let app = spawn_app().await;

    let response = app.register("Jane Doe", "jane", "password123").await;

    assert_eq!(200, response.status().as_u16());
    // Registration issues no tokens
    assert!(refresh_cookie(&response).is_none());
    assert_eq!(1, app.credentials.len());
    assert!(app.refresh_tokens.is_empty());
}

#[tokio::test]
async fn register_returns_409_for_duplicate_login() {
    let app = spawn_app().await;

    let first = app.register("Jane Doe", "jane", "password123").await;
    assert_eq!(200, first.status().as_u16());

    let second = app.register("Someone Else", "jane", "another-password").await;
    assert_eq!(409, second.status().as_u16());

    let body: Value = second.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "ALREADY_EXISTS");
    assert_eq!(1, app.credentials.len());
}

#[tokio::test]
async fn register_returns_400_for_invalid_input() {
    let app = spawn_app().await;

    let test_cases = vec![
        ("Jane Doe", "ja", "password123", "login too short"),
        ("Jane Doe", "jane doe", "password123", "login with space"),
        ("Jane Doe", "jane", "short", "password too short"),
        ("", "jane", "password123", "empty full name"),
        ("Jane\u{7}Doe", "jane", "password123", "control character in name"),
    ];

    for (full_name, login, password, reason) in test_cases {
        let response = app.register(full_name, login, password).await;

        assert_eq!(400, response.status().as_u16(), "Should reject: {}", reason);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["code"], "VALIDATION_ERROR", "Wrong code for: {}", reason);
    }

    assert!(app.credentials.is_empty());
}

#[tokio::test]
async fn register_returns_400_for_missing_fields() {
    let app = spawn_app().await;

    let test_cases = vec![
        (json!({"login": "jane", "password": "password123"}), "missing fullName"),
        (json!({"fullName": "Jane Doe", "password": "password123"}), "missing login"),
        (json!({"fullName": "Jane Doe", "login": "jane"}), "missing password"),
        (json!({}), "missing all fields"),
    ];

    for (body, reason) in test_cases {
        let response = app
            .client
            .post(&format!("{}/user/register", &app.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(400, response.status().as_u16(), "Should reject request: {}", reason);
    }
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_access_token_and_refresh_cookie() {
    let app = spawn_app().await;
    app.register("Jane Doe", "jane", "password123").await;

    let response = app.login("jane", "password123").await;
    assert_eq!(200, response.status().as_u16());

    let set_cookie = response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("refreshToken="))
        .expect("No refresh token cookie")
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/token"));
    assert!(set_cookie.contains("Max-Age=120"));

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["accessToken"].as_str().is_some());
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 30);
    // The refresh token never travels in the body
    assert!(body.get("refreshToken").is_none());

    assert_eq!(1, app.refresh_tokens.len());
}

#[tokio::test]
async fn login_returns_403_for_bad_credentials() {
    let app = spawn_app().await;
    app.register("Jane Doe", "jane", "password123").await;

    let wrong_password = app.login("jane", "wrong-password").await;
    let unknown_login = app.login("nobody", "password123").await;

    assert_eq!(403, wrong_password.status().as_u16());
    assert_eq!(403, unknown_login.status().as_u16());

    // Both failures look the same to the caller
    let wrong_password: Value = wrong_password.json().await.unwrap();
    let unknown_login: Value = unknown_login.json().await.unwrap();
    assert_eq!(wrong_password["code"], "INVALID_CREDENTIALS");
    assert_eq!(wrong_password["code"], unknown_login["code"]);
    assert_eq!(wrong_password["message"], unknown_login["message"]);

    assert!(app.refresh_tokens.is_empty());
}

#[tokio::test]
async fn login_returns_400_for_missing_fields() {
    let app = spawn_app().await;

    let test_cases = vec![
        (json!({"login": "jane"}), "missing password"),
        (json!({"password": "password123"}), "missing login"),
        (json!({"login": "", "password": "password123"}), "empty login"),
        (json!({}), "missing all fields"),
    ];

    for (body, reason) in test_cases {
        let response = app
            .client
            .post(&format!("{}/user/login", &app.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(400, response.status().as_u16(), "Should reject request: {}", reason);
    }
}

// --- Protected Routes Tests ---

#[tokio::test]
async fn me_returns_current_user_for_valid_token() {
    let app = spawn_app().await;
    let (access_token, _) = app.signed_in("Jane Doe", "jane", "password123").await;

    let response = app.me(&access_token).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["login"], "jane");
    assert_eq!(body["fullName"], "Jane Doe");
    assert!(body["id"].as_i64().is_some());
}

#[tokio::test]
async fn me_returns_401_without_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(&format!("{}/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn me_returns_401_for_invalid_token() {
    let app = spawn_app().await;

    let response = app.me("invalid.token.here").await;

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn me_returns_401_for_unknown_subject() {
    let app = spawn_app().await;

    // Well signed, but no user has this id
    let signer = JwtSigner::new(TEST_SECRET, TEST_ISSUER);
    let access_token = signer
        .create(&AccessTokenClaims::new(UserId(999), Duration::seconds(30)))
        .expect("Failed to sign token");

    let response = app.me(&access_token).await;

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn error_id_is_unique_per_response() {
    let app = spawn_app().await;

    let first: Value = app.refresh("garbage").await.json().await.unwrap();
    let second: Value = app.refresh("garbage").await.json().await.unwrap();

    assert_eq!(first["code"], "TOKEN_INVALID");
    assert!(first["error_id"].as_str().is_some());
    assert_ne!(first["error_id"], second["error_id"]);
}

#[tokio::test]
async fn me_returns_403_for_expired_token() {
    let app = spawn_app_with(Duration::zero(), Duration::minutes(2)).await;
    let (access_token, _) = app.signed_in("Jane Doe", "jane", "password123").await;

    let response = app.me(&access_token).await;

    assert_eq!(403, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "TOKEN_EXPIRED");
}

// --- Token Lifecycle Tests ---

#[tokio::test]
async fn refresh_rotates_the_refresh_token() {
    let app = spawn_app().await;
    let (_, refresh_token) = app.signed_in("Jane Doe", "jane", "password123").await;

    let response = app.refresh(&refresh_token).await;
    assert_eq!(200, response.status().as_u16());

    let rotated = refresh_cookie(&response).expect("No refresh token cookie");
    assert_ne!(rotated, refresh_token);

    let body: Value = response.json().await.expect("Failed to parse response");
    let access_token = body["accessToken"].as_str().expect("No access token");

    // The new access token identifies the same user
    let me: Value = app.me(access_token).await.json().await.unwrap();
    assert_eq!(me["login"], "jane");

    // One live record per chain
    assert_eq!(1, app.refresh_tokens.len());
}

#[tokio::test]
async fn replayed_refresh_token_is_rejected() {
    let app = spawn_app().await;
    let (_, refresh_token) = app.signed_in("Jane Doe", "jane", "password123").await;

    let first = app.refresh(&refresh_token).await;
    assert_eq!(200, first.status().as_u16());

    let replay = app.refresh(&refresh_token).await;
    assert_eq!(403, replay.status().as_u16());
    let body: Value = replay.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn refresh_returns_401_without_cookie() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(&format!("{}/token/refresh", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn refresh_returns_403_for_unknown_token() {
    let app = spawn_app().await;

    let well_formed = "A".repeat(64);

    for token in ["garbage", well_formed.as_str()] {
        let response = app.refresh(token).await;
        assert_eq!(403, response.status().as_u16(), "Should reject: {}", token);
    }
}

#[tokio::test]
async fn refresh_returns_403_for_expired_refresh_token() {
    let app = spawn_app_with(Duration::seconds(30), Duration::zero()).await;
    let (_, refresh_token) = app.signed_in("Jane Doe", "jane", "password123").await;

    let response = app.refresh(&refresh_token).await;

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn revoke_ends_the_chain_and_clears_the_cookie() {
    let app = spawn_app().await;
    let (_, refresh_token) = app.signed_in("Jane Doe", "jane", "password123").await;

    let response = app.revoke(&refresh_token).await;
    assert_eq!(204, response.status().as_u16());
    assert_eq!(Some(String::new()), refresh_cookie(&response));
    assert!(app.refresh_tokens.is_empty());

    let refresh = app.refresh(&refresh_token).await;
    assert_eq!(403, refresh.status().as_u16());

    // Revoking again is harmless
    let again = app.revoke(&refresh_token).await;
    assert_eq!(204, again.status().as_u16());
}

#[tokio::test]
async fn revoke_returns_401_without_cookie() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(&format!("{}/token/revoke", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn sessions_of_different_users_are_independent() {
    let app = spawn_app().await;
    let (_, jane_refresh) = app.signed_in("Jane Doe", "jane", "password123").await;
    let (_, john_refresh) = app.signed_in("John Roe", "john", "password456").await;

    assert_eq!(204, app.revoke(&jane_refresh).await.status().as_u16());

    let response = app.refresh(&john_refresh).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let me: Value = app
        .me(body["accessToken"].as_str().unwrap())
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(me["login"], "john");
}
