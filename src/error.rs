/// Application Error Handling
///
/// Every failure in the service funnels into [`AppError`]:
/// 1. Domain-specific error enums (validation, storage, auth, configuration)
/// 2. A single HTTP mapping (status + stable code + caller-safe message)
/// 3. Structured logging keyed by an error id that is echoed to the client
///
/// Internal detail (raw storage errors, hashing failures) is logged but never
/// returned in a response body.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::logger::RequestId;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    /// The request body, path or query could not be decoded
    MalformedInput(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::MalformedInput(detail) => write!(f, "Malformed input: {}", detail),
        }
    }
}

impl StdError for ValidationError {}

/// Storage errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::NotFound(what) => write!(f, "{} not found", what),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// Authentication and authorization errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Wrong email or password. Used for both so accounts can't be enumerated.
    CredentialMismatch,
    MissingHeader,
    MalformedHeader,
    /// Bad signature or structure
    TokenInvalid,
    TokenExpired,
    WrongIssuer,
    MalformedSubject,
    /// Refresh token not found, expired or revoked
    RefreshTokenInvalid,
    /// Authenticated, but not the owner of the resource
    Forbidden,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::CredentialMismatch => write!(f, "Incorrect email or password"),
            AuthError::MissingHeader => write!(f, "Missing authorization header"),
            AuthError::MalformedHeader => write!(f, "Malformed authorization header"),
            AuthError::TokenInvalid => write!(f, "Invalid token"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::WrongIssuer => write!(f, "Token issuer is not accepted"),
            AuthError::MalformedSubject => write!(f, "Token subject is not a valid user id"),
            AuthError::RefreshTokenInvalid => write!(f, "Invalid refresh token"),
            AuthError::Forbidden => write!(f, "Not allowed to modify this resource"),
        }
    }
}

impl StdError for AuthError {}

impl AuthError {
    /// Stable code returned to clients
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::CredentialMismatch => "INVALID_CREDENTIALS",
            AuthError::MissingHeader => "MISSING_TOKEN",
            AuthError::MalformedHeader => "MALFORMED_AUTH_HEADER",
            AuthError::TokenInvalid => "TOKEN_INVALID",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::WrongIssuer => "TOKEN_WRONG_ISSUER",
            AuthError::MalformedSubject => "TOKEN_MALFORMED_SUBJECT",
            AuthError::RefreshTokenInvalid => "REFRESH_TOKEN_INVALID",
            AuthError::Forbidden => "FORBIDDEN",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    Config(ConfigError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => {
                AppError::Database(DatabaseError::NotFound("Record".to_string()))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Database(DatabaseError::ConnectionPool(err.to_string()))
            }
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                AppError::Database(DatabaseError::UniqueConstraintViolation(
                    db_err.message().to_string(),
                ))
            }
            _ => AppError::Database(DatabaseError::UnexpectedError(err.to_string())),
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Unique error ID, also present in the server log
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl AppError {
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(ValidationError::MalformedInput(_)) => (
                StatusCode::BAD_REQUEST,
                "MALFORMED_INPUT",
                "Request could not be decoded".to_string(),
            ),
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),

            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => (
                    StatusCode::CONFLICT,
                    "DUPLICATE_ENTRY",
                    "Resource already exists".to_string(),
                ),
                DatabaseError::NotFound(what) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", format!("{} not found", what))
                }
                DatabaseError::ConnectionPool(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service temporarily unavailable".to_string(),
                ),
                DatabaseError::UnexpectedError(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error occurred".to_string(),
                ),
            },

            AppError::Auth(e) => (e.status_code(), e.code(), e.to_string()),

            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                "Server configuration error".to_string(),
            ),

            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = self.classify();
        let error_response =
            ErrorResponse::new(request_id.to_string(), message, code.to_string(), status.as_u16());

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(request_id = request_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Database(DatabaseError::NotFound(_)) => {
                tracing::info!(request_id = request_id, error = %self, "Record not found");
            }
            AppError::Database(e) => {
                tracing::error!(request_id = request_id, error = %e, "Database error");
            }
            AppError::Auth(AuthError::CredentialMismatch) => {
                tracing::warn!(request_id = request_id, "Invalid credentials attempt");
            }
            AppError::Auth(AuthError::Forbidden) => {
                tracing::warn!(request_id = request_id, "Ownership check denied");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, code = e.code(), "Authentication error");
            }
            AppError::Config(e) => {
                tracing::error!(request_id = request_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

impl AppError {
    /// JSON error response whose `error_id` is `request_id`
    pub fn response_with_id(&self, request_id: &str) -> HttpResponse {
        let (status, error_response) = <Self as ErrorHandler>::error_response(self, request_id);
        HttpResponse::build(status).json(error_response)
    }
}

/// Actix-web integration
///
/// Logging happens in [`LoggerMiddleware`](crate::logger::LoggerMiddleware),
/// which also replaces this body with one keyed by the request id.
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        self.response_with_id(&uuid::Uuid::new_v4().to_string())
    }

    fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-operation context attached to success and failure logs
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(request_id: RequestId, operation: impl Into<String>) -> Self {
        Self {
            request_id: request_id.to_string(),
            user_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl ToString) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn log_error(&self, error: &AppError) {
        let context = serde_json::json!({
            "request_id": self.request_id,
            "operation": self.operation,
            "user_id": self.user_id,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        match error {
            AppError::Validation(_) | AppError::Auth(_) => {
                tracing::warn!(error = %error, context = ?context, "Request rejected");
            }
            _ => {
                tracing::error!(error = %error, context = ?context, "Request failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn test_auth_error_conversion() {
        let app_err: AppError = AuthError::TokenExpired.into();
        match app_err {
            AppError::Auth(AuthError::TokenExpired) => (),
            _ => panic!("Expected TokenExpired"),
        }
    }

    #[test]
    fn test_auth_errors_map_to_401_except_forbidden() {
        let unauthorized = [
            AuthError::CredentialMismatch,
            AuthError::MissingHeader,
            AuthError::MalformedHeader,
            AuthError::TokenInvalid,
            AuthError::TokenExpired,
            AuthError::WrongIssuer,
            AuthError::MalformedSubject,
            AuthError::RefreshTokenInvalid,
        ];
        for err in unauthorized {
            assert_eq!(
                ResponseError::status_code(&AppError::Auth(err)),
                StatusCode::UNAUTHORIZED,
                "{:?}",
                err
            );
        }
        assert_eq!(
            ResponseError::status_code(&AppError::Auth(AuthError::Forbidden)),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let err = AppError::Database(DatabaseError::UnexpectedError(
            "relation \"users\" does not exist".to_string(),
        ));
        let (status, body) = ErrorHandler::error_response(&err, "req-1");

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("users"));
        assert_eq!(body.error_id, "req-1");
    }

    #[test]
    fn test_malformed_input_maps_to_400() {
        let err = AppError::Validation(ValidationError::MalformedInput("EOF".to_string()));
        let (status, body) = ErrorHandler::error_response(&err, "req-2");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "MALFORMED_INPUT");
    }

    #[test]
    fn test_error_context_creation() {
        let request_id = RequestId::new();
        let ctx = ErrorContext::new(request_id, "test_operation");
        assert_eq!(ctx.operation, "test_operation");
        assert_eq!(ctx.request_id, request_id.to_string());
        assert!(ctx.user_id.is_none());

        let ctx_with_user = ctx.with_user_id("user-123");
        assert_eq!(ctx_with_user.user_id, Some("user-123".to_string()));
    }

    #[actix_web::test]
    async fn test_response_carries_given_id() {
        let response = AppError::Auth(AuthError::TokenExpired).response_with_id("req-3");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error_id, "req-3");
        assert_eq!(body.code, "TOKEN_EXPIRED");
    }
}
