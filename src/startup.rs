use actix_web::dev::Server;
use actix_web::{guard, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::configuration::JwtSettings;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, health_check, list_chirps, login, refresh,
    revoke, update_user,
};
use crate::store::Store;

fn malformed(detail: impl ToString) -> actix_web::Error {
    AppError::Validation(ValidationError::MalformedInput(detail.to_string())).into()
}

/// Register shared state, extractor error handlers and every route.
///
/// Used by [`run`] and by the integration tests.
pub fn configure_app(cfg: &mut web::ServiceConfig, store: web::Data<dyn Store>, jwt_config: &JwtSettings) {
    cfg.app_data(store)
        .app_data(web::Data::new(jwt_config.clone()))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| malformed(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _req| malformed(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| malformed(err)))
        .service(
            web::scope("/api")
                .route("/healthz", web::get().to(health_check))
                // Users
                .route("/users", web::post().to(create_user))
                .service(
                    web::resource("/users")
                        .guard(guard::Put())
                        .wrap(JwtMiddleware::new(jwt_config.clone()))
                        .to(update_user),
                )
                // Session
                .route("/login", web::post().to(login))
                .route("/refresh", web::post().to(refresh))
                .route("/revoke", web::post().to(revoke))
                // Chirps
                .route("/chirps", web::get().to(list_chirps))
                .service(
                    web::resource("/chirps")
                        .guard(guard::Post())
                        .wrap(JwtMiddleware::new(jwt_config.clone()))
                        .to(create_chirp),
                )
                .route("/chirps/{chirp_id}", web::get().to(get_chirp))
                .service(
                    web::resource("/chirps/{chirp_id}")
                        .guard(guard::Delete())
                        .wrap(JwtMiddleware::new(jwt_config.clone()))
                        .to(delete_chirp),
                ),
        );
}

pub fn run(
    listener: TcpListener,
    store: Arc<dyn Store>,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let store: web::Data<dyn Store> = web::Data::from(store);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .configure(|cfg| configure_app(cfg, store.clone(), &jwt_config))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
