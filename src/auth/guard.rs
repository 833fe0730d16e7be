/// Request authentication and ownership checks

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::jwt::validate_access_token_at;
use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// The user a validated session token speaks for.
///
/// Lives only for the request it was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn get_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingHeader)?;
    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;

    value
        .strip_prefix(BEARER_PREFIX)
        .map(|token| token.trim().to_string())
        .ok_or(AuthError::MalformedHeader)
}

/// Bearer extraction followed by session token validation
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Principal, AuthError> {
    authenticate_at(headers, secret, Utc::now())
}

pub fn authenticate_at(
    headers: &HeaderMap,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<Principal, AuthError> {
    let token = get_bearer_token(headers)?;
    let user_id = validate_access_token_at(&token, secret, now)?;
    Ok(Principal { user_id })
}

/// Only the recorded owner may mutate a resource
pub fn authorize_ownership(principal: &Principal, owner_id: Uuid) -> Result<(), AuthError> {
    if principal.user_id == owner_id {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %principal.user_id,
            owner_id = %owner_id,
            "Principal is not the resource owner"
        );
        Err(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token_at;
    use actix_web::http::header::HeaderValue;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(get_bearer_token(&HeaderMap::new()), Err(AuthError::MissingHeader));
    }

    #[test]
    fn test_wrong_scheme() {
        assert_eq!(
            get_bearer_token(&headers_with("Basic dXNlcjpwYXNz")),
            Err(AuthError::MalformedHeader)
        );
        assert_eq!(get_bearer_token(&headers_with("Bearer")), Err(AuthError::MalformedHeader));
        assert_eq!(get_bearer_token(&headers_with("bearer abc")), Err(AuthError::MalformedHeader));
    }

    #[test]
    fn test_token_is_trimmed() {
        assert_eq!(get_bearer_token(&headers_with("Bearer   abc.def  ")), Ok("abc.def".to_string()));
    }

    #[test]
    fn test_authenticate_valid_token() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let token = generate_access_token_at(user_id, SECRET, Duration::hours(1), now).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        assert_eq!(authenticate_at(&headers, SECRET, now), Ok(Principal { user_id }));
    }

    #[test]
    fn test_authenticate_propagates_specific_error() {
        let now = Utc::now();
        let token = generate_access_token_at(Uuid::new_v4(), SECRET, Duration::hours(1), now).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        assert_eq!(
            authenticate_at(&headers, SECRET, now + Duration::hours(2)),
            Err(AuthError::TokenExpired)
        );
        assert_eq!(authenticate(&HeaderMap::new(), SECRET), Err(AuthError::MissingHeader));
    }

    #[test]
    fn test_ownership() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        for (principal, owner, allowed) in [
            (alice, alice, true),
            (alice, bob, false),
            (bob, alice, false),
            (bob, bob, true),
        ] {
            let result = authorize_ownership(&Principal { user_id: principal }, owner);
            if allowed {
                assert_eq!(result, Ok(()));
            } else {
                assert_eq!(result, Err(AuthError::Forbidden));
            }
        }
    }
}
