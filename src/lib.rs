//! Credential and token lifecycle service.
//!
//! Verifies logins, issues short-lived signed access tokens with rotating
//! opaque refresh tokens, and supports explicit revocation. The core lives in
//! [`auth`]; the rest is the HTTP shell around it.

pub mod auth;
pub mod configuration;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod validators;
