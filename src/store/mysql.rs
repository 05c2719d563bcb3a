//! MySQL-backed registration store.
//!
//! Wraps a bounded `sqlx` connection pool shared by every in-flight
//! transaction; acquisitions beyond the bound queue rather than fail.
//! Duplicate registrations are detected from the table's unique
//! constraints, not from the advisory pre-read.

use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use tracing::{error, info};

use super::{RegistrationStore, StoreError, UserRecord};
use crate::config::MySqlConfig;

/// Store implementation over a MySQL `users` table.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Creates a store with a lazily connected pool bounded at
    /// `config.max_connections`.
    pub fn new(config: &MySqlConfig) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(&config.url())?;
        Ok(Self { pool })
    }

    /// Acquires and releases one connection to verify the database is
    /// reachable. Logs the outcome either way; an unreachable database at
    /// boot is reported, not fatal.
    pub async fn probe(&self) {
        match self.pool.acquire().await {
            Ok(_conn) => info!("Connected to MySQL database"),
            Err(e) => error!("MySQL connection error: {}", e),
        }
    }
}

#[async_trait::async_trait]
impl RegistrationStore for MySqlStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT first_name, last_name, email, api_key, use_case FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn insert(&self, record: &UserRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (first_name, last_name, email, api_key, use_case) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.email)
        .bind(&record.api_key)
        .bind(&record.use_case)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateKey,
            _ => StoreError::Database(e),
        })?;

        info!("Inserted registration for email: {}", record.email);
        Ok(())
    }
}
