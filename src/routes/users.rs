/// Account Routes
///
/// Registration and credential changes. Both validate input here, at the
/// boundary, and leave hashing and persistence to the session coordinator.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorContext};
use crate::middleware::CurrentUser;
use crate::models::User;
use crate::session::SessionCoordinator;
use crate::validators::{is_valid_email, is_valid_password};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user. The password hash never leaves the server.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
            email: user.email.clone(),
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

/// POST /api/users
///
/// # Errors
/// - 400: malformed email or empty/oversized password
/// - 409: email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    coordinator: web::Data<SessionCoordinator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let user = coordinator.register(&email, &form.password).await?;

    tracing::info!(request_id = %context.request_id, user_id = %user.id, "Account created");
    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// PUT /api/users
///
/// Replaces the caller's email and password. Requires an access token.
pub async fn update_user(
    user: CurrentUser,
    form: web::Json<CredentialsRequest>,
    coordinator: web::Data<SessionCoordinator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_update").with_user_id(user.0.user_id.to_string());

    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let updated = coordinator
        .update_credentials(&user.0, &email, &form.password)
        .await
        .map_err(|e| {
            let err = AppError::from(e);
            context.log_error(&err);
            err
        })?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&updated)))
}
