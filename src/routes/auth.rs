/// Authentication Routes
///
/// Login, session refresh and refresh token revocation.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{
    create_refresh_token, exchange_refresh_token, generate_access_token, get_bearer_token,
    revoke_refresh_token, verify_login_password,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, DatabaseError, ErrorContext};
use crate::logger::RequestId;
use crate::store::Store;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Requested session token lifetime; capped at one hour
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

/// Login response: the user plus both tokens
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
}

/// Refresh response carries only the new session token
#[derive(Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/login
///
/// Authenticate with email and password.
///
/// # Errors
/// - 400: Malformed body
/// - 401: Unknown email or wrong password (same response and cost for both)
/// - 500: Hashing or storage failure
pub async fn login(
    request_id: RequestId,
    form: web::Json<LoginRequest>,
    store: web::Data<dyn Store>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "user_login");
    let form = form.into_inner();

    let user = store.get_user_by_email(form.email.trim()).await?;
    let stored_hash = user.as_ref().map(|u| u.hashed_password.as_str());

    let verified = match verify_login_password(&form.password, stored_hash) {
        Ok(verified) => verified,
        Err(e) => {
            // Corrupt stored hash: logged here, reported as a plain mismatch.
            let context = match &user {
                Some(user) => context.clone().with_user_id(user.id),
                None => context.clone(),
            };
            context.log_error(&e);
            false
        }
    };

    let user = match user {
        Some(user) if verified => user,
        _ => return Err(AuthError::CredentialMismatch.into()),
    };

    let ttl = jwt_config.access_token_ttl(form.expires_in_seconds);
    let token = generate_access_token(user.id, &jwt_config.secret, ttl)?;
    let refresh_token = create_refresh_token(store.get_ref(), user.id).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        expires_in = ttl.num_seconds(),
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        id: user.id,
        created_at: user.created_at,
        updated_at: user.updated_at,
        email: user.email,
        token,
        refresh_token: refresh_token.token,
    }))
}

/// POST /api/refresh
///
/// Exchange the refresh token in `Authorization: Bearer <refresh token>` for
/// a new session token. The refresh token itself is not rotated.
///
/// # Errors
/// - 401: Missing header, or unknown, expired or revoked refresh token
pub async fn refresh(
    req: HttpRequest,
    request_id: RequestId,
    store: web::Data<dyn Store>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "token_refresh");
    let refresh_token = get_bearer_token(req.headers())?;

    let token = exchange_refresh_token(store.get_ref(), &refresh_token, jwt_config.get_ref()).await?;

    tracing::info!(request_id = %context.request_id, "Session token refreshed");

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /api/revoke
///
/// Revoke the refresh token in `Authorization: Bearer <refresh token>`.
///
/// # Errors
/// - 401: Missing header or unknown refresh token
pub async fn revoke(
    req: HttpRequest,
    request_id: RequestId,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "token_revoke");
    let refresh_token = get_bearer_token(req.headers())?;

    match revoke_refresh_token(store.get_ref(), &refresh_token).await {
        Ok(()) => {}
        Err(AppError::Database(DatabaseError::NotFound(_))) => {
            return Err(AuthError::RefreshTokenInvalid.into());
        }
        Err(e) => return Err(e),
    }

    tracing::info!(request_id = %context.request_id, "Refresh token revoked");

    Ok(HttpResponse::NoContent().finish())
}
