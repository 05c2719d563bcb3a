//! Registration transaction orchestration.
//!
//! One [`Registrar::register`] call runs the whole transaction for a single
//! request: validate, uniqueness pre-check, key generation, insert, mail
//! dispatch, response. Each step either proceeds or terminates the
//! transaction with a fixed, user-safe message; internal failure detail is
//! logged server-side only.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use crate::keygen::ApiKeyGenerator;
use crate::mailer::Mailer;
use crate::store::{RegistrationStore, StoreError, UserRecord};

pub const MSG_FIELDS_REQUIRED: &str = "All fields are required.";
pub const MSG_ALREADY_REGISTERED: &str =
    "Email already registered. Please check your email for your API key.";
pub const MSG_SERVER_ERROR: &str = "Server error. Please try again later.";
pub const MSG_SUCCESS: &str = "API key generated and sent to your email!";

pub const MAIL_SUBJECT: &str = "Your FMDb API Key";

/// A registration request as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub use_case: String,
}

/// Outcome status reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// The reply delivered for every registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationResponse {
    pub status: Status,
    pub message: String,
}

impl RegistrationResponse {
    fn success() -> Self {
        Self {
            status: Status::Success,
            message: MSG_SUCCESS.to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            message: message.to_string(),
        }
    }
}

fn mail_body(first_name: &str, api_key: &str) -> String {
    format!(
        "Hello {},\n\nYour API key is: {}\n\nBest regards,\nThe FMDb Team",
        first_name, api_key
    )
}

/// Orchestrator binding store, key generator, and mailer into the
/// registration transaction. Process-scoped; shared by every connection.
pub struct Registrar {
    store: Arc<dyn RegistrationStore>,
    keygen: ApiKeyGenerator,
    mailer: Arc<dyn Mailer>,
}

impl Registrar {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        keygen: ApiKeyGenerator,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            store,
            keygen,
            mailer,
        }
    }

    /// Runs one registration transaction and returns the client-facing
    /// response. Never panics and never leaks internal error detail; every
    /// failure path maps to one of the fixed messages.
    pub async fn register(&self, request: RegistrationRequest) -> RegistrationResponse {
        if request.first_name.is_empty()
            || request.last_name.is_empty()
            || request.email.is_empty()
            || request.use_case.is_empty()
        {
            return RegistrationResponse::error(MSG_FIELDS_REQUIRED);
        }

        debug!("Processing registration for email: {}", request.email);

        // Advisory pre-check. The unique constraint on insert below is the
        // authoritative arbiter when two requests for one email race.
        match self.store.find_by_email(&request.email).await {
            Ok(Some(_)) => return RegistrationResponse::error(MSG_ALREADY_REGISTERED),
            Ok(None) => {}
            Err(e) => {
                error!("Registration lookup failed: {}", e);
                return RegistrationResponse::error(MSG_SERVER_ERROR);
            }
        }

        let api_key = self.keygen.generate();

        let record = UserRecord {
            first_name: request.first_name.clone(),
            last_name: request.last_name,
            email: request.email.clone(),
            api_key: api_key.clone(),
            use_case: request.use_case,
        };

        match self.store.insert(&record).await {
            Ok(()) => {}
            Err(StoreError::DuplicateKey) => {
                return RegistrationResponse::error(MSG_ALREADY_REGISTERED)
            }
            Err(e) => {
                error!("Registration insert failed: {}", e);
                return RegistrationResponse::error(MSG_SERVER_ERROR);
            }
        }

        // The record is already persisted; a dispatch failure is a partial
        // success and does not revoke the key.
        if let Err(e) = self
            .mailer
            .send(
                &request.email,
                MAIL_SUBJECT,
                &mail_body(&request.first_name, &api_key),
            )
            .await
        {
            error!("Failed to deliver API key to {}: {}", request.email, e);
            return RegistrationResponse::error(MSG_SERVER_ERROR);
        }

        debug!("Registration complete for email: {}", request.email);
        RegistrationResponse::success()
    }
}
