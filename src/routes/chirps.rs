/// Chirp Routes
///
/// Reads are public. Creating needs an access token; deleting also needs
/// the caller to own the chirp.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, DatabaseError, ValidationError};
use crate::middleware::CurrentUser;
use crate::models::Chirp;
use crate::profanity::clean_body;
use crate::session::SessionCoordinator;
use crate::store::Store;
use crate::validators::is_valid_chirp_body;

#[derive(Deserialize)]
pub struct ChirpRequest {
    pub body: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub author_id: Option<String>,
    pub sort: Option<String>,
}

#[derive(Serialize)]
pub struct ChirpResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub body: String,
    pub user_id: String,
}

impl From<&Chirp> for ChirpResponse {
    fn from(chirp: &Chirp) -> Self {
        Self {
            id: chirp.id.to_string(),
            created_at: chirp.created_at.to_rfc3339(),
            updated_at: chirp.updated_at.to_rfc3339(),
            body: chirp.body.clone(),
            user_id: chirp.user_id.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ValidateChirpResponse {
    pub valid: bool,
    pub cleaned_body: String,
}

/// POST /api/chirps
pub async fn create_chirp(
    user: CurrentUser,
    form: web::Json<ChirpRequest>,
    coordinator: web::Data<SessionCoordinator>,
) -> Result<HttpResponse, AppError> {
    is_valid_chirp_body(&form.body)?;
    let body = clean_body(&form.body);

    let chirp = coordinator.create_chirp(&user.0, &body).await?;

    Ok(HttpResponse::Created().json(ChirpResponse::from(&chirp)))
}

/// GET /api/chirps
///
/// `author_id` filters by author; `sort=desc` flips the default
/// oldest-first order.
pub async fn list_chirps(
    query: web::Query<ListQuery>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let author = match query.author_id.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            Uuid::parse_str(raw)
                .map_err(|_| ValidationError::InvalidFormat("author_id".to_string()))?,
        ),
        None => None,
    };

    let mut chirps = store.list_chirps(author).await?;
    if query.sort.as_deref() == Some("desc") {
        chirps.reverse();
    }

    let body: Vec<ChirpResponse> = chirps.iter().map(ChirpResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    path: web::Path<String>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let not_found = || DatabaseError::NotFound("chirp".to_string());

    let chirp_id = Uuid::parse_str(&path).map_err(|_| not_found())?;
    let chirp = store.get_chirp(chirp_id).await?.ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(ChirpResponse::from(&chirp)))
}

/// DELETE /api/chirps/{chirp_id}
///
/// # Errors
/// - 401: no valid access token
/// - 403: chirp missing or owned by someone else
pub async fn delete_chirp(
    user: CurrentUser,
    path: web::Path<String>,
    coordinator: web::Data<SessionCoordinator>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = Uuid::parse_str(&path)
        .map_err(|_| ValidationError::InvalidFormat("chirp_id".to_string()))?;

    coordinator.delete_chirp(&user.0, chirp_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/validate_chirp
pub async fn validate_chirp(form: web::Json<ChirpRequest>) -> Result<HttpResponse, AppError> {
    is_valid_chirp_body(&form.body)?;

    Ok(HttpResponse::Ok().json(ValidateChirpResponse {
        valid: true,
        cleaned_body: clean_body(&form.body),
    }))
}
