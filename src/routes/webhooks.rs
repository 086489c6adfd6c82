use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::error::{AppError, ValidationError};
use crate::middleware::authorization_header;
use crate::session::SessionCoordinator;

#[derive(Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Deserialize, Default)]
pub struct WebhookData {
    #[serde(default)]
    pub user_id: String,
}

/// POST /api/polka/webhooks
///
/// Payment-provider callback, authenticated by the shared API key sent as
/// `Authorization: Bearer <key>`. The key is checked before the body is
/// decoded. Unhandled events are acknowledged with 204.
pub async fn polka_webhook(
    req: HttpRequest,
    body: web::Bytes,
    coordinator: web::Data<SessionCoordinator>,
) -> Result<HttpResponse, AppError> {
    let authorization = authorization_header(&req);
    coordinator.authorize_api_key(authorization)?;

    let payload: WebhookRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Malformed webhook body");
        ValidationError::InvalidFormat("webhook body".to_string())
    })?;

    let outcome = coordinator
        .handle_webhook(authorization, &payload.event, &payload.data.user_id)
        .await?;

    tracing::debug!(event = %payload.event, outcome = ?outcome, "Webhook handled");
    Ok(HttpResponse::NoContent().finish())
}
