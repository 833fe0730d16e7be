/// Refresh Token Management
///
/// Refresh tokens are opaque random strings held server-side. Each login
/// creates one; it lives for 60 days unless revoked first. Refreshing does
/// not rotate the token, it only mints a new session token.
///
/// ```text
/// Active --revoke--> Revoked   (terminal)
/// Active --60 days-> Expired   (terminal, evaluated at read time)
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::jwt::generate_access_token_at;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::store::RefreshTokenStore;

/// Lifetime of a refresh token from creation
pub const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 60;

/// Random bytes per token before hex encoding (64 hex chars)
const REFRESH_TOKEN_BYTES: usize = 32;

/// A persisted refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Active,
    Revoked,
    Expired,
}

impl RefreshToken {
    pub fn new(token: String, user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            token,
            user_id,
            created_at: now,
            expires_at: now + Duration::days(REFRESH_TOKEN_LIFETIME_DAYS),
            revoked_at: None,
        }
    }

    /// Revocation wins over expiry when both apply
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.revoked_at.is_some() {
            RefreshTokenState::Revoked
        } else if now > self.expires_at {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }
}

/// Generate a new cryptographically secure refresh token value
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Create and persist a refresh token for `user_id`
///
/// Existing tokens for the user are left alone; every login gets its own.
pub async fn create_refresh_token<S>(store: &S, user_id: Uuid) -> Result<RefreshToken, AppError>
where
    S: RefreshTokenStore + ?Sized,
{
    create_refresh_token_at(store, user_id, Utc::now()).await
}

pub async fn create_refresh_token_at<S>(
    store: &S,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<RefreshToken, AppError>
where
    S: RefreshTokenStore + ?Sized,
{
    let record = RefreshToken::new(generate_refresh_token(), user_id, now);
    store.insert_refresh_token(&record).await?;

    tracing::debug!(user_id = %user_id, expires_at = %record.expires_at, "Refresh token created");
    Ok(record)
}

/// Look up a refresh token by its exact value
///
/// # Errors
/// `DatabaseError::NotFound` if no record carries this value
pub async fn resolve_refresh_token<S>(store: &S, token: &str) -> Result<RefreshToken, AppError>
where
    S: RefreshTokenStore + ?Sized,
{
    store
        .get_refresh_token(token)
        .await?
        .ok_or_else(|| AppError::Database(DatabaseError::NotFound("Refresh token".to_string())))
}

/// Revoke a refresh token
///
/// # Errors
/// `DatabaseError::NotFound` if no record carries this value
pub async fn revoke_refresh_token<S>(store: &S, token: &str) -> Result<(), AppError>
where
    S: RefreshTokenStore + ?Sized,
{
    revoke_refresh_token_at(store, token, Utc::now()).await
}

pub async fn revoke_refresh_token_at<S>(
    store: &S,
    token: &str,
    now: DateTime<Utc>,
) -> Result<(), AppError>
where
    S: RefreshTokenStore + ?Sized,
{
    if store.revoke_refresh_token(token, now).await? {
        Ok(())
    } else {
        Err(AppError::Database(DatabaseError::NotFound("Refresh token".to_string())))
    }
}

/// Exchange a refresh token for a new session token
///
/// Unknown, expired and revoked tokens all fail with `RefreshTokenInvalid`.
/// Storage failures are propagated unchanged.
pub async fn exchange_refresh_token<S>(
    store: &S,
    token: &str,
    jwt_config: &JwtSettings,
) -> Result<String, AppError>
where
    S: RefreshTokenStore + ?Sized,
{
    exchange_refresh_token_at(store, token, jwt_config, Utc::now()).await
}

pub async fn exchange_refresh_token_at<S>(
    store: &S,
    token: &str,
    jwt_config: &JwtSettings,
    now: DateTime<Utc>,
) -> Result<String, AppError>
where
    S: RefreshTokenStore + ?Sized,
{
    let record = match resolve_refresh_token(store, token).await {
        Ok(record) => record,
        Err(AppError::Database(DatabaseError::NotFound(_))) => {
            tracing::debug!("Refresh token not found");
            return Err(AuthError::RefreshTokenInvalid.into());
        }
        Err(e) => return Err(e),
    };

    match record.state_at(now) {
        RefreshTokenState::Active => {}
        RefreshTokenState::Revoked => {
            tracing::debug!(user_id = %record.user_id, "Attempt to use revoked refresh token");
            return Err(AuthError::RefreshTokenInvalid.into());
        }
        RefreshTokenState::Expired => {
            tracing::debug!(user_id = %record.user_id, "Refresh token expired");
            return Err(AuthError::RefreshTokenInvalid.into());
        }
    }

    generate_access_token_at(
        record.user_id,
        &jwt_config.secret,
        jwt_config.access_token_ttl(None),
        now,
    )
}
