/// Token Routes
///
/// Refresh-token rotation and revocation. Both read the refresh token from
/// the `refreshToken` cookie.

use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::AuthEngine;
use crate::error::{AppError, ErrorContext};
use crate::routes::auth::{refresh_token_cookie, session_response, REFRESH_TOKEN_COOKIE};

fn refresh_token_from(req: &HttpRequest) -> Result<String, AppError> {
    req.cookie(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::MissingCredentials("refresh token cookie"))
}

/// POST /token/refresh
///
/// Rotate the refresh token and mint a new access token. The presented
/// token is consumed: replaying it afterwards fails.
///
/// # Errors
/// - 401: No refresh token cookie
/// - 403: Refresh token malformed, unknown, expired, rotated or revoked
/// - 500: Internal server error
pub async fn refresh(
    req: HttpRequest,
    engine: web::Data<AuthEngine>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");
    let presented = refresh_token_from(&req)?;

    let tokens = engine
        .refresh(&presented)
        .await
        .map_err(|e| context.record(e.into()))?;

    Ok(session_response(tokens, &engine))
}

/// POST /token/revoke
///
/// End the refresh-token chain and clear the cookie.
///
/// # Errors
/// - 401: No refresh token cookie
/// - 500: Internal server error
pub async fn revoke(
    req: HttpRequest,
    engine: web::Data<AuthEngine>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_revoke");
    let presented = refresh_token_from(&req)?;

    engine
        .revoke(&presented)
        .await
        .map_err(|e| context.record(e.into()))?;

    let mut removal = refresh_token_cookie("", 0);
    removal.make_removal();

    Ok(HttpResponse::NoContent().cookie(removal).finish())
}
