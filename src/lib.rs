/// FMDb Registration Service Library
///
/// This library provides the core functionality for the FMDb API
/// registration service: a realtime WebSocket endpoint that enriches each
/// connection with geo-IP metadata and runs registration transactions that
/// issue API keys, persist them to MySQL, and deliver them by email.
///
/// # Modules
/// - `config`: Environment-sourced configuration
/// - `keygen`: API key generation
/// - `store`: Registration storage (MySQL via sqlx)
/// - `mailer`: Outbound mail dispatch
/// - `geoip`: Geo-IP enrichment client
/// - `registration`: The registration transaction orchestrator
/// - `session`: Per-connection session handling and wire protocol
/// - `server`: HTTP/WebSocket surface
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use fmdb_registration::{
///     config::Config,
///     geoip::GeoIpClient,
///     keygen::ApiKeyGenerator,
///     mailer::HttpMailer,
///     registration::Registrar,
///     store::MySqlStore,
/// };
///
/// fn setup_service() {
///     let config = Config::new().expect("Failed to load configuration");
///     let store = MySqlStore::new(&config.mysql).expect("Failed to create store");
///     let mailer = HttpMailer::new(config.mail.clone()).expect("Failed to create mailer");
///     let geoip = GeoIpClient::new(config.geoip.clone()).expect("Failed to create geo-ip client");
///     let registrar = Registrar::new(Arc::new(store), ApiKeyGenerator::new(), Arc::new(mailer));
/// }
/// ```

pub mod config;
pub mod geoip;
pub mod keygen;
pub mod mailer;
pub mod registration;
pub mod server;
pub mod session;
pub mod store;
