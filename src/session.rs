/// Session Coordinator
///
/// Orchestrates login, refresh, revoke and the authorization gates on top
/// of the auth primitives and the store. Every store or hashing failure is
/// translated here into exactly one `AuthError` kind; raw backend errors are
/// logged and never handed to the caller.
///
/// Access tokens are stateless and cannot be revoked before they expire.
/// Refresh tokens are store-backed; revoking one only stops future refreshes.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::{
    extract_bearer, generate_refresh_token, hash_password, issue_access_token,
    validate_access_token, verify_password,
};
use crate::configuration::AuthSettings;
use crate::error::{AuthError, DatabaseError};
use crate::models::{AuthenticatedIdentity, Chirp, RevokeOutcome, User};
use crate::store::Store;

const UPGRADE_EVENT: &str = "user.upgraded";

/// Tokens and profile handed back by a successful login
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// What a webhook delivery did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Upgraded,
    Ignored,
}

pub struct SessionCoordinator {
    store: Arc<dyn Store>,
    settings: AuthSettings,
}

impl SessionCoordinator {
    pub fn new(store: Arc<dyn Store>, settings: AuthSettings) -> Self {
        Self { store, settings }
    }

    /// Create an account. The password is hashed before it reaches the store.
    ///
    /// # Errors
    /// - `Conflict` if the email is already registered
    /// - `Internal` on hashing or store failure
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let hashed_password = self.hash(password).await?;

        let user = self
            .store
            .create_user(email, &hashed_password)
            .await
            .map_err(|e| user_write_failure("create_user", e))?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verify credentials and open a session.
    ///
    /// Issues a short-lived access token and persists a fresh refresh token.
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown email or a wrong password
    /// - `Internal` on store, hashing or signing failure
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, AuthError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await
            .map_err(|e| store_failure("get_user_by_email", e))?
            .ok_or_else(|| {
                tracing::info!("Login attempt for unknown email");
                AuthError::InvalidCredentials
            })?;

        self.verify(&user.hashed_password, password).await?;

        let access_token = self.issue_access_token(user.id)?;
        let refresh_token = generate_refresh_token();
        let expires_at = Utc::now() + Duration::seconds(self.settings.refresh_token_expiry);

        self.store
            .create_refresh_token(&refresh_token, user.id, expires_at)
            .await
            .map_err(|e| store_failure("create_refresh_token", e))?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginSession {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Mint a new access token from a bearer refresh token.
    ///
    /// The refresh token is not rotated; it stays valid until it expires or
    /// is revoked.
    ///
    /// # Errors
    /// - `BadRequest` for a missing or malformed header
    /// - `Unauthorized` if the token is unknown, expired or revoked
    pub async fn refresh(&self, authorization: Option<&str>) -> Result<String, AuthError> {
        let token = extract_bearer(authorization)?;

        let record = self
            .store
            .get_refresh_token(&token)
            .await
            .map_err(|e| store_failure("get_refresh_token", e))?
            .ok_or_else(|| {
                tracing::warn!("Refresh attempted with unknown token");
                AuthError::Unauthorized
            })?;

        if !record.is_active(Utc::now()) {
            tracing::warn!(user_id = %record.user_id, "Refresh attempted with expired or revoked token");
            return Err(AuthError::Unauthorized);
        }

        let access_token = self.issue_access_token(record.user_id)?;
        tracing::debug!(user_id = %record.user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke a bearer refresh token.
    ///
    /// Revoking a token twice is fine: the second call finds it in the
    /// terminal state and succeeds without touching it.
    ///
    /// # Errors
    /// - `BadRequest` for a missing or malformed header
    /// - `Unauthorized` if the token was never issued
    pub async fn revoke(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        let token = extract_bearer(authorization)?;

        let outcome = self
            .store
            .revoke_refresh_token(&token)
            .await
            .map_err(|e| store_failure("revoke_refresh_token", e))?;

        match outcome {
            RevokeOutcome::Revoked => {
                tracing::info!("Refresh token revoked");
                Ok(())
            }
            RevokeOutcome::AlreadyRevoked => Ok(()),
            RevokeOutcome::NotFound => {
                tracing::warn!("Revoke attempted with unknown token");
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// Resolve the caller behind a bearer access token. No store lookup.
    pub fn authenticate(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let token = extract_bearer(authorization)?;
        let user_id =
            validate_access_token(&token, &self.settings.jwt_secret, &self.settings.issuer)?;
        Ok(AuthenticatedIdentity { user_id })
    }

    /// Allow `identity` to act on a resource owned by `owner_id`
    pub fn authorize_owner(
        &self,
        identity: &AuthenticatedIdentity,
        owner_id: Uuid,
    ) -> Result<(), AuthError> {
        if identity.user_id == owner_id {
            Ok(())
        } else {
            tracing::warn!(user_id = %identity.user_id, "Ownership check failed");
            Err(AuthError::Forbidden)
        }
    }

    /// Check a bearer API key against the configured webhook key
    pub fn authorize_api_key(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        let presented = extract_bearer(authorization)?;
        if keys_match(&presented, &self.settings.polka_key) {
            Ok(())
        } else {
            tracing::warn!("Webhook presented a bad API key");
            Err(AuthError::Unauthorized)
        }
    }

    /// Change the caller's email and password.
    ///
    /// # Errors
    /// - `Conflict` if the new email belongs to someone else
    /// - `Unauthorized` if the account behind the token no longer exists
    pub async fn update_credentials(
        &self,
        identity: &AuthenticatedIdentity,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let hashed_password = self.hash(password).await?;

        let user = self
            .store
            .update_user_credentials(identity.user_id, email, &hashed_password)
            .await
            .map_err(|e| user_write_failure("update_user_credentials", e))?
            .ok_or(AuthError::Unauthorized)?;

        tracing::info!(user_id = %user.id, "User credentials updated");
        Ok(user)
    }

    /// Post a chirp as the caller. `body` is stored as given.
    ///
    /// A token that outlived its account is `Unauthorized`.
    pub async fn create_chirp(
        &self,
        identity: &AuthenticatedIdentity,
        body: &str,
    ) -> Result<Chirp, AuthError> {
        let chirp = self
            .store
            .create_chirp(identity.user_id, body)
            .await
            .map_err(|e| match e {
                DatabaseError::ForeignKeyViolation(_) => {
                    tracing::warn!(user_id = %identity.user_id, "Chirp posted for a deleted account");
                    AuthError::Unauthorized
                }
                other => store_failure("create_chirp", other),
            })?;

        tracing::info!(user_id = %identity.user_id, chirp_id = %chirp.id, "Chirp created");
        Ok(chirp)
    }

    /// Delete a chirp on behalf of its author.
    ///
    /// A missing chirp and someone else's chirp are both `Forbidden`, so a
    /// non-owner learns nothing about which chirps exist.
    pub async fn delete_chirp(
        &self,
        identity: &AuthenticatedIdentity,
        chirp_id: Uuid,
    ) -> Result<(), AuthError> {
        let chirp = self
            .store
            .get_chirp(chirp_id)
            .await
            .map_err(|e| store_failure("get_chirp", e))?;

        let owner_id = match chirp {
            Some(chirp) => chirp.user_id,
            None => {
                tracing::warn!(user_id = %identity.user_id, chirp_id = %chirp_id, "Delete of missing chirp");
                return Err(AuthError::Forbidden);
            }
        };
        self.authorize_owner(identity, owner_id)?;

        // a concurrent delete by the owner leaves the same end state
        self.store
            .delete_chirp(chirp_id)
            .await
            .map_err(|e| store_failure("delete_chirp", e))?;

        tracing::info!(user_id = %identity.user_id, chirp_id = %chirp_id, "Chirp deleted");
        Ok(())
    }

    /// Apply a payment-provider webhook.
    ///
    /// The API key is checked before the event is looked at. Events other
    /// than `user.upgraded` are acknowledged and ignored.
    ///
    /// # Errors
    /// - `Unauthorized` for a wrong API key
    /// - `BadRequest` if the user id is not a UUID
    /// - `NotFound` if no such user exists
    pub async fn handle_webhook(
        &self,
        authorization: Option<&str>,
        event: &str,
        user_id: &str,
    ) -> Result<WebhookOutcome, AuthError> {
        self.authorize_api_key(authorization)?;

        if event != UPGRADE_EVENT {
            tracing::debug!(event = event, "Ignoring webhook event");
            return Ok(WebhookOutcome::Ignored);
        }

        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| AuthError::BadRequest("user_id is not a valid UUID".to_string()))?;

        let found = self
            .store
            .set_user_privileged(user_id)
            .await
            .map_err(|e| store_failure("set_user_privileged", e))?;

        if !found {
            return Err(AuthError::NotFound);
        }

        tracing::info!(user_id = %user_id, "User upgraded to Chirpy Red");
        Ok(WebhookOutcome::Upgraded)
    }

    fn issue_access_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        issue_access_token(
            user_id,
            &self.settings.jwt_secret,
            Duration::seconds(self.settings.access_token_expiry),
            &self.settings.issuer,
        )
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let cost = self.settings.password_hash_cost;

        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify(&self, hashed_password: &str, password: &str) -> Result<(), AuthError> {
        let hashed_password = hashed_password.to_string();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || verify_password(&hashed_password, &password))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))?
    }
}

fn store_failure(operation: &'static str, err: DatabaseError) -> AuthError {
    tracing::error!(operation = operation, error = %err, "Store call failed");
    AuthError::Internal(format!("{} failed", operation))
}

fn user_write_failure(operation: &'static str, err: DatabaseError) -> AuthError {
    match err {
        DatabaseError::UniqueConstraintViolation(_) => AuthError::Conflict,
        other => store_failure(operation, other),
    }
}

/// Exact match without an early exit. Comparing fixed-length digests keeps
/// the key length out of the timing as well. An unset key matches nothing.
fn keys_match(presented: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
