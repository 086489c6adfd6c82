use actix_web::{web, HttpResponse};

use crate::configuration::ApplicationSettings;
use crate::error::{AppError, AuthError};
use crate::middleware::Metrics;
use crate::store::Store;

const DEV_PLATFORM: &str = "dev";

/// GET /admin/metrics
pub async fn metrics(metrics: web::Data<Metrics>) -> HttpResponse {
    let page = format!(
        "<html>\n  <body>\n    <h1>Welcome, Chirpy Admin</h1>\n    <p>Chirpy has been visited {} times!</p>\n  </body>\n</html>",
        metrics.hits()
    );

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page)
}

/// POST /admin/reset
///
/// Zeroes the hit counter and wipes every user (chirps and refresh tokens
/// go with them). Only available when the platform is `dev`.
pub async fn reset(
    app: web::Data<ApplicationSettings>,
    metrics: web::Data<Metrics>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    if app.platform != DEV_PLATFORM {
        tracing::warn!(platform = %app.platform, "Reset refused outside dev");
        return Err(AuthError::Forbidden.into());
    }

    metrics.reset();
    store.delete_all_users().await?;

    tracing::info!("Metrics and database reset");
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Hits reset to 0 and database reset to initial state."))
}
