//! HTTP and WebSocket surface.
//!
//! One listener serves the plain-text liveness endpoint at `/` and the
//! WebSocket upgrade at `/ws`. Process-scoped services are constructed at
//! startup and handed to each session explicitly.

use axum::extract::connect_info::ConnectInfo;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::geoip::GeoIpClient;
use crate::registration::Registrar;
use crate::session::{client_ip, ConnectionSession};

const STATUS_TEXT: &str = "The FMDb API Server - Status: Running";

/// Services shared across handlers.
#[derive(Clone)]
struct AppState {
    registrar: Arc<Registrar>,
    geoip: Arc<GeoIpClient>,
}

/// Builds the CORS layer from the configured origin. An unparseable origin
/// is logged and degraded to allow-any rather than refusing to start.
fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origin == "*" {
        return layer.allow_origin(Any);
    }

    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}

fn router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/ws", get(ws_handler))
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

/// Liveness endpoint.
async fn status() -> &'static str {
    STATUS_TEXT
}

/// Upgrades the connection and hands it to a session.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let ip = client_ip(&headers, peer);
    ws.on_upgrade(move |socket| {
        ConnectionSession::new(state.registrar, state.geoip, ip).handle(socket)
    })
}

/// Binds the listener and serves until the process stops.
pub async fn serve(
    config: &ServerConfig,
    registrar: Arc<Registrar>,
    geoip: Arc<GeoIpClient>,
) -> anyhow::Result<()> {
    let state = AppState { registrar, geoip };
    let app = router(state, &config.cors_origin);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Socket server running on port {}", config.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
