/// Access-token authentication for route handlers.
///
/// Handlers that act as a user take a `CurrentUser` argument; extraction
/// validates the bearer access token before the handler body runs, so no
/// store call happens for an unauthenticated caller.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::AuthenticatedIdentity;
use crate::session::SessionCoordinator;

#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub AuthenticatedIdentity);

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<CurrentUser, AppError> {
    let coordinator = req
        .app_data::<web::Data<SessionCoordinator>>()
        .ok_or_else(|| AppError::Internal("session coordinator not registered".to_string()))?;

    let identity = coordinator.authenticate(authorization_header(req))?;
    tracing::debug!(user_id = %identity.user_id, "Access token validated");

    Ok(CurrentUser(identity))
}

/// Raw `Authorization` header value, if present and valid UTF-8
pub fn authorization_header(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
}
