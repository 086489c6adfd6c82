/// Refresh Token Generation
///
/// Refresh tokens are opaque 32-byte random values, hex encoded. Their
/// lifecycle (expiry, revocation) lives in the store; see
/// `crate::store::RefreshTokenStore`.

use rand::{thread_rng, RngCore};
use sha2::{Digest, Sha256};

const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a new cryptographically secure refresh token
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 digest of a token, hex encoded
///
/// Persistent backends key rows by this digest so a leaked table does not
/// hand out usable tokens.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
