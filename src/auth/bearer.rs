/// Bearer credential extraction.
///
/// Turns an `Authorization` header value into the raw credential. The
/// extractor does not care what the credential is; access tokens, refresh
/// tokens and the webhook API key all travel this way.

use crate::error::AuthError;

const BEARER_SCHEME: &str = "Bearer";

/// Extract the token from `Bearer <token>`
///
/// # Errors
/// `BadRequest` when the header is absent or empty, the scheme is not
/// `Bearer`, or there is not exactly one credential after it
pub fn extract_bearer(header: Option<&str>) -> Result<String, AuthError> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AuthError::BadRequest("missing authorization header".to_string()))?;

    let mut fields = header.split_whitespace();
    let scheme = fields.next().unwrap_or_default();
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthError::BadRequest(
            "authorization scheme must be Bearer".to_string(),
        ));
    }

    match (fields.next(), fields.next()) {
        (Some(token), None) => Ok(token.to_string()),
        (None, _) => Err(AuthError::BadRequest(
            "authorization header carries no credential".to_string(),
        )),
        (Some(_), Some(_)) => Err(AuthError::BadRequest(
            "malformed authorization header".to_string(),
        )),
    }
}
