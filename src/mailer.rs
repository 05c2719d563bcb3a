//! Outbound mail dispatch.
//!
//! Delivery goes through an HTTP mail API (Mailgun-style form POST with
//! basic auth). Failures are reported to the caller and never retried
//! here; by the time dispatch runs the registration record is already
//! persisted, so the caller treats a failure as a partial success.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::config::MailConfig;

/// Error types for mail dispatch
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail provider rejected message: {0}")]
    Rejected(String),
}

/// Dispatcher for plain-text notification mail.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message. Reported failures leave retry policy to the
    /// caller.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Mailer implementation over an HTTP mail API.
pub struct HttpMailer {
    config: MailConfig,
    client: Client,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let request = MailRequest {
            from: &self.config.from,
            to,
            subject,
            text: body,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .form(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("Failed to send mail to {}: {}", to, detail);
            return Err(DeliveryError::Rejected(detail));
        }

        info!("Sent mail to {}: {}", to, subject);
        Ok(())
    }
}
