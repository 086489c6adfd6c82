use actix_files as fs;
use actix_web::dev::Server;
use actix_web::error::JsonPayloadError;
use actix_web::{web, App, HttpRequest, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::middleware::{HitCounter, Metrics, RequestLogger};
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, health_check, list_chirps, login, metrics,
    polka_webhook, refresh, reset, revoke, update_user, validate_chirp,
};
use crate::session::SessionCoordinator;
use crate::store::Store;

const STATIC_DIR: &str = "./public";

pub fn run(
    listener: TcpListener,
    store: Arc<dyn Store>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let coordinator = web::Data::new(SessionCoordinator::new(store.clone(), settings.auth));
    let store = web::Data::from(store);
    let app_settings = web::Data::new(settings.application);
    let hit_metrics = Arc::new(Metrics::new());
    let metrics_data = web::Data::from(hit_metrics.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            // Shared state
            .app_data(coordinator.clone())
            .app_data(store.clone())
            .app_data(app_settings.clone())
            .app_data(metrics_data.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            // Static site, every hit counted
            .service(
                web::scope("/app")
                    .wrap(HitCounter::new(hit_metrics.clone()))
                    .service(fs::Files::new("/", STATIC_DIR).index_file("index.html")),
            )
            .service(
                web::scope("/admin")
                    .route("/metrics", web::get().to(metrics))
                    .route("/reset", web::post().to(reset)),
            )
            .service(
                web::scope("/api")
                    .route("/healthz", web::get().to(health_check))
                    .route("/validate_chirp", web::post().to(validate_chirp))
                    .route("/users", web::post().to(create_user))
                    .route("/users", web::put().to(update_user))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/revoke", web::post().to(revoke))
                    .route("/chirps", web::post().to(create_chirp))
                    .route("/chirps", web::get().to(list_chirps))
                    .route("/chirps/{chirp_id}", web::get().to(get_chirp))
                    .route("/chirps/{chirp_id}", web::delete().to(delete_chirp))
                    .route("/polka/webhooks", web::post().to(polka_webhook)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Render undecodable JSON bodies as a regular `ErrorResponse`; serde's
/// message is logged, not returned.
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::warn!(error = %err, "Rejected JSON payload");
    AppError::Validation(ValidationError::InvalidFormat("request body".to_string())).into()
}
