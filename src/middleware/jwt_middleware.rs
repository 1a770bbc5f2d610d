/// Bearer Token Middleware
///
/// Verifies the access token from the Authorization header and injects the
/// subject's `UserId` into request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::AuthEngine;
use crate::error::{AppError, ErrorContext};

/// Middleware for routes that require an access token
pub struct BearerAuth {
    engine: Arc<AuthEngine>,
}

impl BearerAuth {
    pub fn new(engine: Arc<AuthEngine>) -> Self {
        Self { engine }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(BearerAuthService {
            service: Rc::new(service),
            engine: self.engine.clone(),
        }))
    }
}

pub struct BearerAuthService<S> {
    service: Rc<S>,
    engine: Arc<AuthEngine>,
}

/// Extract `<token>` from `Bearer <token>`
fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string);

        let Some(token) = token else {
            let error = ErrorContext::new("bearer_auth")
                .record(AppError::MissingCredentials("bearer token"));
            return Box::pin(async move { Err(error.into()) });
        };

        match self.engine.identity_from_access_token(&token) {
            Ok(user_id) => {
                req.extensions_mut().insert(user_id);
                tracing::debug!(user_id = %user_id, "Access token validated");

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                let error = ErrorContext::new("bearer_auth").record(AppError::Auth(e));
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}
