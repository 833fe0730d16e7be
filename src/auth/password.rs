/// Password Hashing and Verification
///
/// Argon2id with a fresh random salt per hash. The output is a PHC string
/// (`$argon2id$v=19$m=...,t=...,p=...$salt$digest`) carrying every parameter
/// needed to verify it later.

use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Argon2,
};
use lazy_static::lazy_static;

use crate::error::AppError;

lazy_static! {
    // Same parameters as every real hash, so verifying against it costs the same.
    static ref STAND_IN_HASH: Option<String> = hash_password("chirpy-stand-in-password").ok();
}

/// Hash a password using Argon2id
///
/// # Errors
/// Only if the underlying primitive fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored PHC hash
///
/// Returns `Ok(false)` on mismatch. The digest comparison is constant time.
///
/// # Errors
/// Returns error if `hash` is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Malformed password hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Check a login attempt against the account's stored hash, or against a
/// stand-in hash when no account matched.
///
/// One full argon2 verification runs in both cases, so an unknown email takes
/// as long to reject as a wrong password. No account always yields `Ok(false)`.
///
/// # Errors
/// Returns error if the stored hash is malformed
pub fn verify_login_password(password: &str, stored_hash: Option<&str>) -> Result<bool, AppError> {
    match stored_hash {
        Some(hash) => verify_password(password, hash),
        None => {
            if let Some(stand_in) = STAND_IN_HASH.as_deref() {
                let _ = verify_password(password, stand_in);
            }
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "secret123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let first = hash_password("secret123").expect("Failed to hash password");
        let second = hash_password("secret123").expect("Failed to hash password");

        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let password = "secret123";
        let hash = hash_password(password).expect("Failed to hash password");

        let is_valid = verify_password(password, &hash).expect("Failed to verify password");
        assert!(is_valid);
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("secret123").expect("Failed to hash password");

        let is_valid = verify_password("secret124", &hash).expect("Failed to verify password");
        assert!(!is_valid);
    }

    #[test]
    fn test_empty_password_round_trip() {
        let hash = hash_password("").expect("Failed to hash password");

        assert!(verify_password("", &hash).expect("Failed to verify password"));
        assert!(!verify_password(" ", &hash).expect("Failed to verify password"));
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("secret123", "not-a-phc-string").is_err());
        assert!(verify_password("secret123", "").is_err());
    }

    #[test]
    fn test_login_without_account_never_matches() {
        assert!(!verify_login_password("secret123", None).expect("Failed to verify password"));
        assert!(!verify_login_password("chirpy-stand-in-password", None)
            .expect("Failed to verify password"));
    }

    #[test]
    fn test_login_with_account_checks_stored_hash() {
        let hash = hash_password("secret123").expect("Failed to hash password");

        assert!(verify_login_password("secret123", Some(&hash)).expect("Failed to verify password"));
        assert!(!verify_login_password("secret124", Some(&hash)).expect("Failed to verify password"));
        assert!(verify_login_password("secret123", Some("not-a-phc-string")).is_err());
    }

    #[test]
    fn test_stand_in_hash_costs_the_same_as_a_real_hash() {
        let stand_in = STAND_IN_HASH.as_deref().expect("Stand-in hash was not built");
        let real = hash_password("secret123").expect("Failed to hash password");

        let params = |hash: &str| hash.split('$').take(4).collect::<Vec<_>>().join("$");
        assert!(stand_in.starts_with("$argon2id$"));
        assert_eq!(params(stand_in), params(&real));
    }
}
