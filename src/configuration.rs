use chrono::Duration;

use crate::error::ConfigError;

/// Longest lifetime a session token may be issued with, in seconds
pub const MAX_ACCESS_TOKEN_EXPIRY: i64 = 3600;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    /// Absent means the in-memory store is used
    pub database: Option<DatabaseSettings>,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    /// Server-level connection string, used to create databases
    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Session token settings
///
/// The secret is read once at startup and never rotated while running.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    /// Default session token lifetime in seconds, clamped to [`MAX_ACCESS_TOKEN_EXPIRY`]
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
}

fn default_access_token_expiry() -> i64 {
    MAX_ACCESS_TOKEN_EXPIRY
}

impl JwtSettings {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_expiry: MAX_ACCESS_TOKEN_EXPIRY,
        }
    }

    /// Lifetime for a new session token.
    ///
    /// A missing or non-positive request falls back to the configured default;
    /// anything longer than an hour is silently clamped.
    pub fn access_token_ttl(&self, requested_seconds: Option<i64>) -> Duration {
        let default = self.access_token_expiry.clamp(1, MAX_ACCESS_TOKEN_EXPIRY);
        let seconds = match requested_seconds {
            Some(s) if s > 0 => s.min(MAX_ACCESS_TOKEN_EXPIRY),
            _ => default,
        };
        Duration::seconds(seconds)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if self.jwt.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt.access_token_expiry must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load settings from an optional `configuration` file, overlaid by
/// `APP_`-prefixed environment variables. Nested keys are joined with `__`,
/// e.g. `APP_JWT__SECRET` or `APP_APPLICATION__PORT`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
