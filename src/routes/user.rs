use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::auth::{IdentitySession, UserId};
use crate::error::{AppError, ErrorContext};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub login: String,
    pub full_name: String,
}

/// GET /me
///
/// Identity of the access token's subject. Requires
/// `Authorization: Bearer <access_token>`; the subject is injected by the
/// bearer middleware.
pub async fn me(
    user_id: web::ReqData<UserId>,
    session: web::Data<IdentitySession>,
) -> Result<HttpResponse, AppError> {
    let user_id = user_id.into_inner();
    let context = ErrorContext::new("current_user").with_user_id(user_id.to_string());

    let user = session
        .current_user(user_id)
        .await
        .map_err(|e| context.record(e.into()))?;

    Ok(HttpResponse::Ok().json(MeResponse {
        id: user.id.0,
        login: user.login,
        full_name: user.display_name,
    }))
}
