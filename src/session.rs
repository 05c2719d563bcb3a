//! Per-connection session handling.
//!
//! Each accepted WebSocket gets one [`ConnectionSession`] that walks the
//! lifecycle `Connecting -> Enriching -> Active -> Closed`: resolve the
//! client address, run the geo-IP enrichment once, then serve registration
//! events until the peer disconnects. A session failure never escapes the
//! owning connection.

use axum::extract::ws::{Message, WebSocket};
use axum::http::HeaderMap;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::geoip::{Enrichment, GeoIpClient};
use crate::registration::{Registrar, RegistrationRequest, RegistrationResponse};

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Connecting,
    Enriching,
    Active,
    Closed,
}

/// Events the client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
enum ClientEvent {
    Register(RegistrationRequest),
}

/// Events the server emits.
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    LocationInfo(Enrichment),
    RegistrationResponse(RegistrationResponse),
}

impl ServerEvent {
    fn to_message(&self) -> Message {
        // The event enum serializes infallibly.
        Message::Text(serde_json::to_string(self).unwrap_or_default())
    }
}

/// Extracts the client address for enrichment: the first `x-forwarded-for`
/// entry when a proxy supplied one, else the transport peer address.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string())
}

/// One live client connection.
pub struct ConnectionSession {
    registrar: Arc<Registrar>,
    geoip: Arc<GeoIpClient>,
    client_ip: String,
    state: SessionState,
}

impl ConnectionSession {
    pub fn new(registrar: Arc<Registrar>, geoip: Arc<GeoIpClient>, client_ip: String) -> Self {
        Self {
            registrar,
            geoip,
            client_ip,
            state: SessionState::Connecting,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            "Session {}: {:?} -> {:?}",
            self.client_ip, self.state, next
        );
        self.state = next;
    }

    /// Drives the connection from accept to disconnect.
    pub async fn handle(mut self, mut socket: WebSocket) {
        self.transition(SessionState::Enriching);
        if let Some(event) = self.enrich().await {
            if socket.send(event.to_message()).await.is_err() {
                self.transition(SessionState::Closed);
                info!("Client disconnected during enrichment, IP: {}", self.client_ip);
                return;
            }
        }

        self.transition(SessionState::Active);
        while let Some(result) = socket.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if let Some(event) = self.handle_text(&text).await {
                        if let Err(e) = socket.send(event.to_message()).await {
                            error!("Failed to send response to {}: {}", self.client_ip, e);
                            break;
                        }
                    }
                }
                Ok(Message::Ping(data)) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Pong(_)) => {}
                Ok(Message::Binary(_)) => {
                    debug!("Ignoring binary frame from {}", self.client_ip);
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    warn!("WebSocket error for {}: {}", self.client_ip, e);
                    break;
                }
            }
        }

        self.transition(SessionState::Closed);
        info!("Client disconnected, IP: {}", self.client_ip);
    }

    /// Runs the one-shot enrichment. Returns an event to emit only when
    /// the provider had data; lookup failures are contained here.
    async fn enrich(&self) -> Option<ServerEvent> {
        match self.geoip.lookup(&self.client_ip).await {
            Ok(enrichment) if enrichment.has_data() => {
                info!(
                    "Client connected, IP: {}, Location: {}, {}, ISP: {}",
                    self.client_ip,
                    enrichment.city.as_deref().unwrap_or("-"),
                    enrichment.country.as_deref().unwrap_or("-"),
                    enrichment.isp.as_deref().unwrap_or("-"),
                );
                Some(ServerEvent::LocationInfo(enrichment))
            }
            Ok(_) => {
                info!("Client connected, IP: {}, Location: unavailable", self.client_ip);
                None
            }
            Err(e) => {
                error!("Error fetching location for {}: {}", self.client_ip, e);
                None
            }
        }
    }

    /// Dispatches one inbound text frame. Unknown events and malformed
    /// frames are dropped; each `register` runs its own transaction.
    async fn handle_text(&self, text: &str) -> Option<ServerEvent> {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(ClientEvent::Register(request)) => {
                let response = self.registrar.register(request).await;
                Some(ServerEvent::RegistrationResponse(response))
            }
            Err(e) => {
                debug!("Dropping unrecognized frame from {}: {}", self.client_ip, e);
                None
            }
        }
    }
}
