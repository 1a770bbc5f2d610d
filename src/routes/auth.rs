/// User Routes
///
/// Registration and login. Login answers with the access token in the body
/// and the refresh token in an HttpOnly cookie scoped to `/token`.

use actix_web::cookie::{time, Cookie};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthEngine, IdentitySession, SessionTokens};
use crate::error::{AppError, ErrorContext};
use crate::validators::{is_valid_login, is_valid_name, is_valid_password, require_present};

pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const REFRESH_TOKEN_COOKIE_PATH: &str = "/token";

/// User registration request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    pub full_name: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Access token response body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Cookie carrying the refresh token back to the client
pub fn refresh_token_cookie(value: &str, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(REFRESH_TOKEN_COOKIE, value.to_string())
        .path(REFRESH_TOKEN_COOKIE_PATH)
        .http_only(true)
        .max_age(time::Duration::seconds(max_age_secs))
        .finish()
}

/// Build the shared login/refresh response
pub fn session_response(tokens: SessionTokens, engine: &AuthEngine) -> HttpResponse {
    let cookie = refresh_token_cookie(
        tokens.refresh_token.as_str(),
        engine.refresh_token_expiry_secs(),
    );

    HttpResponse::Ok().cookie(cookie).json(AccessTokenResponse {
        access_token: tokens.access_token,
        token_type: "Bearer".to_string(),
        expires_in: engine.access_token_expiry_secs(),
    })
}

/// POST /user/register
///
/// Register a new user. Issues no tokens: the caller logs in afterwards.
///
/// # Errors
/// - 400: Validation errors (login/password/fullName)
/// - 409: Login already taken
/// - 500: Internal server error
pub async fn register(
    form: web::Json<RegisterRequest>,
    session: web::Data<IdentitySession>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let login = is_valid_login(&form.login)?;
    let display_name = is_valid_name(&form.full_name)?;
    is_valid_password(&form.password)?;

    session
        .register(&display_name, &login, &form.password)
        .await
        .map_err(|e| context.record(e.into()))?;

    tracing::info!(request_id = %context.request_id, "Registration completed");

    Ok(HttpResponse::Ok().finish())
}

/// POST /user/login
///
/// Authenticate with login and password.
///
/// # Errors
/// - 400: Missing login or password
/// - 403: Invalid login/password combination (same answer for unknown
///   login and wrong password)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    session: web::Data<IdentitySession>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let login = form.login.trim();
    require_present("login", login)?;
    require_present("password", &form.password)?;

    let tokens = session
        .login(login, &form.password)
        .await
        .map_err(|e| context.record(e.into()))?;

    tracing::info!(request_id = %context.request_id, "User logged in");

    Ok(session_response(tokens, session.engine()))
}
