//! Geo-IP enrichment client.
//!
//! Resolves a client address to approximate location and network metadata
//! via an ip-api.com-style provider. Enrichment is strictly best-effort: a
//! provider that answers "fail" yields an ip-only result rather than an
//! error, and transport failures are contained by the calling session.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::GeoIpConfig;

/// Error types for enrichment lookups
#[derive(Error, Debug)]
pub enum GeoIpError {
    #[error("geo-ip transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("geo-ip provider returned status {0}")]
    BadStatus(u16),
}

/// Best-effort location metadata for one connection. Fields beyond `ip`
/// are absent when the provider has no data for the address.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Enrichment {
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
}

impl Enrichment {
    fn empty(ip: &str) -> Self {
        Self {
            ip: ip.to_string(),
            city: None,
            region: None,
            country: None,
            isp: None,
        }
    }

    /// Whether the lookup produced anything beyond the bare address.
    pub fn has_data(&self) -> bool {
        self.city.is_some() || self.region.is_some() || self.country.is_some() || self.isp.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    status: String,
    message: Option<String>,
    city: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    country: Option<String>,
    isp: Option<String>,
}

/// Client for the geo-IP provider.
pub struct GeoIpClient {
    client: Client,
    base_url: String,
}

impl GeoIpClient {
    pub fn new(config: GeoIpConfig) -> Result<Self, GeoIpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    /// Looks up `ip` with the provider. A "fail" answer is data, not an
    /// error: the result carries only the address. Transport-level
    /// failures surface as `GeoIpError`.
    pub async fn lookup(&self, ip: &str) -> Result<Enrichment, GeoIpError> {
        let url = format!("{}/json/{}", self.base_url, ip);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(GeoIpError::BadStatus(response.status().as_u16()));
        }

        let data: ProviderResponse = response.json().await?;
        if data.status != "success" {
            info!(
                "Location unavailable for {} (provider response: {})",
                ip,
                data.message.as_deref().unwrap_or("unknown")
            );
            return Ok(Enrichment::empty(ip));
        }

        Ok(Enrichment {
            ip: ip.to_string(),
            city: data.city,
            region: data.region_name,
            country: data.country,
            isp: data.isp,
        })
    }
}
