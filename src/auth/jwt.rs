/// Session Token Generation and Validation
///
/// Session tokens are HS256-signed JWTs keyed by the server secret. They are
/// never persisted: validity is the signature, the issuer and the clock.
///
/// The `_at` variants take the current time explicitly so expiry can be
/// exercised without waiting.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ACCESS_TOKEN_ISSUER};
use crate::error::{AppError, AuthError};

/// Issue a session token for `user_id` that lives for `ttl`
///
/// # Errors
/// Returns an internal error if signing fails
pub fn generate_access_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, AppError> {
    generate_access_token_at(user_id, secret, ttl, Utc::now())
}

pub fn generate_access_token_at(
    user_id: Uuid,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let claims = Claims::new(user_id, ttl, now);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate a session token and return its subject
///
/// # Errors
/// - `TokenInvalid` if the signature or structure is wrong
/// - `TokenExpired` if the current time is past `exp`
/// - `WrongIssuer` if `iss` is not the session token issuer
/// - `MalformedSubject` if `sub` is not a UUID
pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    validate_access_token_at(token, secret, Utc::now())
}

pub fn validate_access_token_at(
    token: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<Uuid, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry and issuer are checked below against our own clock and constant.
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("JWT decode error: {}", e);
        AuthError::TokenInvalid
    })?;

    if claims.is_expired_at(now) {
        return Err(AuthError::TokenExpired);
    }

    if claims.iss != ACCESS_TOKEN_ISSUER {
        tracing::debug!(issuer = %claims.iss, "Signed token with unexpected issuer");
        return Err(AuthError::WrongIssuer);
    }

    claims.user_id()
}
