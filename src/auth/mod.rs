/// Authentication module
///
/// Password hashing, access token issue/validation, refresh token
/// generation, and bearer header parsing. The stateful orchestration of
/// these lives in `crate::session`.

mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;

pub use bearer::extract_bearer;
pub use claims::Claims;
pub use jwt::issue_access_token;
pub use jwt::validate_access_token;
pub use password::hash_password;
pub use password::verify_password;
pub use refresh_token::generate_refresh_token;
pub use refresh_token::hash_token;
