/// User Routes
///
/// Account creation and self-service profile updates.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, Principal};
use crate::error::{AppError, DatabaseError, ErrorContext};
use crate::logger::RequestId;
use crate::store::{Store, User};
use crate::validators::{is_valid_email, is_valid_password};

/// User registration request
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

/// Profile update request; the email is kept when omitted
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Public view of a user (no password hash)
#[derive(Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
        }
    }
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email or password outside 8..=128 characters
/// - 409: Email already registered
pub async fn create_user(
    request_id: RequestId,
    form: web::Json<CreateUserRequest>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id, "user_registration");

    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;
    let hashed_password = hash_password(&form.password)?;

    let user = store.create_user(&email, &hashed_password).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// PUT /api/users
///
/// **Requires a valid session token.** Updates the authenticated user only.
///
/// # Errors
/// - 400: Invalid email or password
/// - 401: Missing or invalid token (handled by middleware)
/// - 404: The token's user no longer exists
/// - 409: New email already taken
pub async fn update_user(
    request_id: RequestId,
    principal: web::ReqData<Principal>,
    form: web::Json<UpdateUserRequest>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let principal = principal.into_inner();
    let context = ErrorContext::new(request_id, "user_update").with_user_id(principal.user_id);

    // The record is looked up by the token's subject, so it is always the caller's own.
    let existing = store
        .get_user(principal.user_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User".to_string()))?;

    let email = match &form.email {
        Some(email) => is_valid_email(email)?,
        None => existing.email.clone(),
    };
    is_valid_password(&form.password)?;
    let hashed_password = hash_password(&form.password)?;

    let user = store.update_user(existing.id, &email, &hashed_password).await?;

    tracing::info!(request_id = %context.request_id, user_id = %user.id, "User updated");

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
