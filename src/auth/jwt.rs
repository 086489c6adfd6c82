/// JWT Token Generation and Validation
///
/// Access tokens are stateless HS256 JWTs. Validity is decided entirely by
/// signature, issuer and expiry at verification time.

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::error::AuthError;

/// Issue a signed access token for a user
///
/// # Arguments
/// * `user_id` - Subject of the token
/// * `secret` - Server-held HMAC key, never embedded in the token
/// * `ttl` - Lifetime from now
/// * `issuer` - Value of the `iss` claim
///
/// # Errors
/// Returns `Internal` if encoding fails
pub fn issue_access_token(
    user_id: Uuid,
    secret: &str,
    ttl: Duration,
    issuer: &str,
) -> Result<String, AuthError> {
    let claims = Claims::new(user_id, ttl, issuer.to_string());

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate an access token and return the user it was issued for
///
/// # Errors
/// Returns `Unauthorized` if the token is malformed, signed with another
/// secret, carries another issuer, or `now >= exp`
pub fn validate_access_token(token: &str, secret: &str, issuer: &str) -> Result<Uuid, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("JWT validation error: {}", e);
            AuthError::Unauthorized
        })?;

    // jsonwebtoken accepts exp == now; the boundary counts as expired here
    if claims.is_expired() {
        tracing::debug!("JWT rejected at expiry boundary");
        return Err(AuthError::Unauthorized);
    }

    claims.user_id()
}
