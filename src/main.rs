use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;
use chirpy::configuration::get_configuration;
use chirpy::startup::run;
use chirpy::store::{MemoryStore, PgStore, Store};
use chirpy::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    if let Err(e) = configuration.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Configuration error",
        ));
    }
    tracing::info!("Configuration loaded successfully");

    let store: Arc<dyn Store> = match &configuration.database {
        Some(database) => {
            tracing::info!(host = %database.host, database = %database.database_name, "Connecting to database");

            let pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .connect(&database.connection_string())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create connection pool: {}", e);
                    std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "Database connection error",
                    )
                })?;

            tracing::info!("Database connection pool created successfully");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("No database configured, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, store, configuration.jwt.clone())?;
    server.await
}
