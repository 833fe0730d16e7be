use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{Chirp, ChirpStore, RefreshTokenStore, User, UserStore};
use crate::auth::RefreshToken;
use crate::error::{AppError, DatabaseError};

/// Process-local store for tests and database-less runs.
///
/// Each map sits behind its own lock; no lock is held across an await.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    chirps: RwLock<Vec<Chirp>>,
    refresh_tokens: RwLock<HashMap<String, RefreshToken>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, AppError> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "email already registered".to_string(),
            )
            .into());
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().values().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, AppError> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email == email && u.id != id) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "email already registered".to_string(),
            )
            .into());
        }

        let user = users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("User".to_string()))?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl ChirpStore for MemoryStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<Chirp, AppError> {
        let now = Utc::now();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        self.chirps.write().push(chirp.clone());
        Ok(chirp)
    }

    async fn list_chirps(&self, author_id: Option<Uuid>) -> Result<Vec<Chirp>, AppError> {
        let mut chirps: Vec<Chirp> = self
            .chirps
            .read()
            .iter()
            .filter(|c| author_id.map_or(true, |author| c.user_id == author))
            .cloned()
            .collect();
        chirps.sort_by_key(|c| c.created_at);
        Ok(chirps)
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, AppError> {
        Ok(self.chirps.read().iter().find(|c| c.id == id).cloned())
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<bool, AppError> {
        let mut chirps = self.chirps.write();
        let before = chirps.len();
        chirps.retain(|c| c.id != id);
        Ok(chirps.len() != before)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn insert_refresh_token(&self, record: &RefreshToken) -> Result<(), AppError> {
        let mut tokens = self.refresh_tokens.write();
        if tokens.contains_key(&record.token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh token already exists".to_string(),
            )
            .into());
        }
        tokens.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        Ok(self.refresh_tokens.read().get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<bool, AppError> {
        match self.refresh_tokens.write().get_mut(token) {
            Some(record) => {
                record.revoked_at.get_or_insert(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.create_user("a@x.com", "hash").await.unwrap();

        let result = store.create_user("a@x.com", "hash").await;
        assert!(matches!(
            result,
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let store = MemoryStore::new();
        let result = store.update_user(Uuid::new_v4(), "a@x.com", "hash").await;

        assert!(matches!(result, Err(AppError::Database(DatabaseError::NotFound(_)))));
    }

    #[tokio::test]
    async fn test_list_chirps_by_author() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.create_chirp(alice, "one").await.unwrap();
        store.create_chirp(bob, "two").await.unwrap();
        store.create_chirp(alice, "three").await.unwrap();

        let all = store.list_chirps(None).await.unwrap();
        assert_eq!(all.len(), 3);

        let bodies: Vec<String> = store
            .list_chirps(Some(alice))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(bodies, vec!["one", "three"]);
    }

    #[tokio::test]
    async fn test_delete_chirp() {
        let store = MemoryStore::new();
        let chirp = store.create_chirp(Uuid::new_v4(), "bye").await.unwrap();

        assert!(store.delete_chirp(chirp.id).await.unwrap());
        assert!(!store.delete_chirp(chirp.id).await.unwrap());
        assert!(store.get_chirp(chirp.id).await.unwrap().is_none());
    }
}
