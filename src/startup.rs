use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AuthEngine, IdentitySession};
use crate::logger::RequestLogger;
use crate::middleware::BearerAuth;
use crate::routes::{health_check, login, me, public, refresh, register, revoke};

pub fn run(listener: TcpListener, session: Arc<IdentitySession>) -> Result<Server, std::io::Error> {
    let engine = session.engine().clone();
    let session = web::Data::from(session);
    let engine_data = web::Data::from(engine.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(RequestLogger)

            // Shared state
            .app_data(session.clone())
            .app_data(engine_data.clone())

            // Public routes (no authentication required)
            .route("/health_check", web::get().to(health_check))
            .route("/public", web::get().to(public))
            .route("/user/register", web::post().to(register))
            .route("/user/login", web::post().to(login))
            .route("/token/refresh", web::post().to(refresh))
            .route("/token/revoke", web::post().to(revoke))

            // Protected routes (require an access token)
            .service(
                web::resource("/me")
                    .wrap(BearerAuth::new(engine.clone()))
                    .route(web::get().to(me)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
