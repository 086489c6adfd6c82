/// Session Routes
///
/// Login hands out an access token and a refresh token. Refresh and revoke
/// read the refresh token from the `Authorization: Bearer` header.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorContext};
use crate::middleware::authorization_header;
use crate::routes::users::UserResponse;
use crate::session::SessionCoordinator;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 401: unknown email or wrong password (indistinguishable)
pub async fn login(
    form: web::Json<LoginRequest>,
    coordinator: web::Data<SessionCoordinator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let session = coordinator
        .login(form.email.trim(), &form.password)
        .await
        .map_err(|e| {
            let err = AppError::from(e);
            context.log_error(&err);
            err
        })?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserResponse::from(&session.user),
        token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

/// POST /api/refresh
///
/// # Errors
/// - 400: missing or malformed bearer header
/// - 401: refresh token unknown, expired or revoked
pub async fn refresh(
    req: HttpRequest,
    coordinator: web::Data<SessionCoordinator>,
) -> Result<HttpResponse, AppError> {
    let token = coordinator.refresh(authorization_header(&req)).await?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /api/revoke
pub async fn revoke(
    req: HttpRequest,
    coordinator: web::Data<SessionCoordinator>,
) -> Result<HttpResponse, AppError> {
    coordinator.revoke(authorization_header(&req)).await?;
    Ok(HttpResponse::NoContent().finish())
}
