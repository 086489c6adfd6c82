use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ChirpStore, RefreshTokenStore, StoreResult, UserStore};
use crate::error::DatabaseError;
use crate::models::{Chirp, RefreshToken, RevokeOutcome, User};

/// Process-local store used by tests and `database.in_memory` mode.
///
/// A single lock guards all tables, which gives every operation the same
/// row-level atomicity the Postgres backend relies on.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    // insertion order doubles as creation order
    chirps: Vec<Chirp>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User> {
        let mut state = self.state.lock().await;
        if state.email_taken(email, None) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_chirpy_red: false,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> StoreResult<Option<User>> {
        let mut state = self.state.lock().await;
        if state.email_taken(email, Some(user_id)) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        Ok(state.users.get_mut(&user_id).map(|user| {
            user.email = email.to_string();
            user.hashed_password = hashed_password.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_user_privileged(&self, user_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.users.get_mut(&user_id) {
            Some(user) => {
                user.is_chirpy_red = true;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_all_users(&self) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.users.clear();
        state.chirps.clear();
        state.refresh_tokens.clear();
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryStore {
    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshToken> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&user_id) {
            return Err(DatabaseError::ForeignKeyViolation(
                "refresh_tokens_user_id_fkey".to_string(),
            ));
        }
        if state.refresh_tokens.contains_key(token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh_tokens_pkey".to_string(),
            ));
        }

        let record = RefreshToken {
            user_id,
            created_at: Utc::now(),
            expires_at,
            revoked_at: None,
        };
        state.refresh_tokens.insert(token.to_string(), record.clone());
        Ok(record)
    }

    async fn get_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        let state = self.state.lock().await;
        Ok(state.refresh_tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str) -> StoreResult<RevokeOutcome> {
        let mut state = self.state.lock().await;
        let outcome = match state.refresh_tokens.get_mut(token) {
            None => RevokeOutcome::NotFound,
            Some(record) if record.revoked_at.is_some() => RevokeOutcome::AlreadyRevoked,
            Some(record) => {
                record.revoked_at = Some(Utc::now());
                RevokeOutcome::Revoked
            }
        };
        Ok(outcome)
    }
}

#[async_trait]
impl ChirpStore for InMemoryStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> StoreResult<Chirp> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&user_id) {
            return Err(DatabaseError::ForeignKeyViolation(
                "chirps_user_id_fkey".to_string(),
            ));
        }

        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        state.chirps.push(chirp.clone());
        Ok(chirp)
    }

    async fn list_chirps(&self, author: Option<Uuid>) -> StoreResult<Vec<Chirp>> {
        let state = self.state.lock().await;
        let mut chirps: Vec<Chirp> = state
            .chirps
            .iter()
            .filter(|c| author.map_or(true, |a| c.user_id == a))
            .cloned()
            .collect();
        chirps.sort_by_key(|c| c.created_at);
        Ok(chirps)
    }

    async fn get_chirp(&self, chirp_id: Uuid) -> StoreResult<Option<Chirp>> {
        let state = self.state.lock().await;
        Ok(state.chirps.iter().find(|c| c.id == chirp_id).cloned())
    }

    async fn delete_chirp(&self, chirp_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.chirps.len();
        state.chirps.retain(|c| c.id != chirp_id);
        Ok(state.chirps.len() != before)
    }
}
