//! Data-access contracts.
//!
//! Handlers and the session coordinator only see these traits; the
//! Postgres and in-memory backends implement them.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::models::{Chirp, RefreshToken, RevokeOutcome, User};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, DatabaseError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UniqueConstraintViolation` if the email is taken.
    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Returns `None` when no user has this id.
    async fn update_user_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> StoreResult<Option<User>>;

    /// Sets the privilege flag. Returns `false` when no user has this id.
    async fn set_user_privileged(&self, user_id: Uuid) -> StoreResult<bool>;

    /// Removes every user together with their chirps and refresh tokens.
    async fn delete_all_users(&self) -> StoreResult<()>;
}

/// Persistence for refresh tokens. Only the session coordinator calls this.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshToken>;

    async fn get_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>>;

    /// Sets `revoked_at` if it is still null. Never clears it.
    async fn revoke_refresh_token(&self, token: &str) -> StoreResult<RevokeOutcome>;
}

#[async_trait]
pub trait ChirpStore: Send + Sync {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> StoreResult<Chirp>;

    /// All chirps, or only `author`'s, oldest first.
    async fn list_chirps(&self, author: Option<Uuid>) -> StoreResult<Vec<Chirp>>;

    async fn get_chirp(&self, chirp_id: Uuid) -> StoreResult<Option<Chirp>>;

    /// Returns `false` when the chirp did not exist.
    async fn delete_chirp(&self, chirp_id: Uuid) -> StoreResult<bool>;
}

pub trait Store: UserStore + RefreshTokenStore + ChirpStore {}

impl<T: UserStore + RefreshTokenStore + ChirpStore> Store for T {}
