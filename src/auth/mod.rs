/// Authentication module
///
/// Password hashing, session token signing/validation, refresh token
/// lifecycle, and the request guard that ties them together.

mod claims;
mod guard;
mod jwt;
mod password;
mod refresh_token;

pub use claims::{Claims, ACCESS_TOKEN_ISSUER};
pub use guard::{authenticate, authenticate_at, authorize_ownership, get_bearer_token, Principal};
pub use jwt::{
    generate_access_token, generate_access_token_at, validate_access_token,
    validate_access_token_at,
};
pub use password::{hash_password, verify_login_password, verify_password};
pub use refresh_token::{
    create_refresh_token, create_refresh_token_at, exchange_refresh_token,
    exchange_refresh_token_at, generate_refresh_token, resolve_refresh_token,
    revoke_refresh_token, revoke_refresh_token_at, RefreshToken, RefreshTokenState,
    REFRESH_TOKEN_LIFETIME_DAYS,
};
