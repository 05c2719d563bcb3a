//! FMDb Registration Service
//!
//! Main entry point for the FMDb API registration service. Clients connect
//! over a persistent WebSocket, receive a best-effort geo-IP enrichment on
//! connect, and may submit registration requests that are validated,
//! deduplicated against MySQL, issued a generated API key, persisted, and
//! delivered by email.
//!
//! # Flow
//! 1. Client connects; the session resolves the client IP and runs one
//!    geo-IP lookup, emitting `locationInfo` when data is available
//! 2. Client submits a `register` event
//! 3. The registrar validates, checks uniqueness, generates a key,
//!    persists the record, and dispatches the key by email
//! 4. Client receives a `registrationResponse` event

use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::fmt;

use fmdb_registration::config::Config;
use fmdb_registration::geoip::GeoIpClient;
use fmdb_registration::keygen::ApiKeyGenerator;
use fmdb_registration::mailer::HttpMailer;
use fmdb_registration::registration::Registrar;
use fmdb_registration::server;
use fmdb_registration::store::MySqlStore;

/// Initializes the logging system with appropriate configuration.
///
/// Sets up structured logging with timestamps and log levels using
/// the tracing framework.
fn setup_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    fmt()
        .with_max_level(Level::DEBUG)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_level(true)
        .with_ansi(true)
        .with_writer(std::io::stdout)
        .try_init()
        .map_err(|e| e.into())
}

/// Constructs the process-scoped services and starts the server.
///
/// # Arguments
/// * `config` - Application configuration
async fn setup_services(config: Config) -> anyhow::Result<()> {
    info!(
        "Initializing MySQL store for database: {}",
        config.mysql.database
    );
    let store = MySqlStore::new(&config.mysql)?;
    store.probe().await;

    info!("Initializing mailer for API: {}", config.mail.api_url);
    let mailer = HttpMailer::new(config.mail.clone())?;

    info!(
        "Initializing geo-ip client for provider: {}",
        config.geoip.base_url
    );
    let geoip = Arc::new(GeoIpClient::new(config.geoip.clone())?);

    let registrar = Arc::new(Registrar::new(
        Arc::new(store),
        ApiKeyGenerator::new(),
        Arc::new(mailer),
    ));

    server::serve(&config.server, registrar, geoip).await
}

/// Main entry point for the registration service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging().map_err(|e| anyhow::anyhow!(e))?;
    info!("FMDb Registration Service starting up...");

    let config = Config::new()?;
    info!("Configuration loaded successfully");

    setup_services(config).await
}
