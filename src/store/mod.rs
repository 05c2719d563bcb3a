//! Registration storage.
//!
//! Defines the store contract the registration transaction runs against and
//! the persisted user record. The concrete MySQL implementation lives in
//! [`mysql`]; the trait seam keeps the orchestrator testable against fakes.

pub mod mysql;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use mysql::MySqlStore;

/// A registered user as persisted in the `users` table.
///
/// `email` and `api_key` each carry a unique constraint at the storage
/// layer; a record is created exactly once by a successful registration and
/// is never mutated or deleted by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub api_key: String,
    pub use_case: String,
}

/// Error types for store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The insert collided with an existing `email` or `api_key`. Raised by
    /// the database's unique constraint, which is the authoritative arbiter
    /// when two registrations for the same email race.
    #[error("unique constraint violated")]
    DuplicateKey,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable record store keyed by email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Looks up the record registered under `email`, if any. Reflects the
    /// latest committed insert.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Inserts a new record. Fails with [`StoreError::DuplicateKey`] if the
    /// email or API key already exists.
    async fn insert(&self, record: &UserRecord) -> Result<(), StoreError>;
}
