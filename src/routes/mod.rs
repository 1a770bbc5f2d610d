mod auth;
mod public;
mod token;
mod user;

pub use auth::{login, register, AccessTokenResponse, REFRESH_TOKEN_COOKIE};
pub use public::{health_check, public};
pub use token::{refresh, revoke};
pub use user::me;
