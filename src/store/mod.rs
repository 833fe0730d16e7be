/// Persistence contracts
///
/// Handlers and the auth module only talk to these traits. Consistency
/// (unique emails, unique token values, atomic revoke) is the backing
/// store's job; nothing above this layer takes locks.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::RefreshToken;
use crate::error::AppError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A registered user, including the stored password hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chirp {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UniqueConstraintViolation` if the email is taken
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, AppError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Fails with `NotFound` if the user does not exist
    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, AppError>;
}

#[async_trait]
pub trait ChirpStore: Send + Sync {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<Chirp, AppError>;

    /// Oldest first, optionally restricted to one author
    async fn list_chirps(&self, author_id: Option<Uuid>) -> Result<Vec<Chirp>, AppError>;

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, AppError>;

    /// Returns `false` if there was nothing to delete
    async fn delete_chirp(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Refresh token records, addressed only by token value
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert_refresh_token(&self, record: &RefreshToken) -> Result<(), AppError>;

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError>;

    /// Sets `revoked_at` unless already set. Returns `false` if the token is unknown.
    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<bool, AppError>;
}

/// Everything the HTTP layer needs from storage
pub trait Store: UserStore + ChirpStore + RefreshTokenStore {}

impl<T> Store for T where T: UserStore + ChirpStore + RefreshTokenStore {}
