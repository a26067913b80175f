//! Custom error types for the common library
//!
//! This module defines the error types raised by configuration loading,
//! the service container, and the database context.

use sqlx::Error as SqlxError;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The named connection string was absent or blank when first needed
    #[error("Connection string '{0}' is not configured")]
    MissingConnectionString(String),

    /// A write was rejected by a unique constraint
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(#[source] MigrateError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Classify a failed statement, separating unique-constraint violations
    pub fn from_query(e: SqlxError) -> Self {
        match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => DatabaseError::UniqueViolation(
                db_err.constraint().unwrap_or("unknown").to_string(),
            ),
            _ => DatabaseError::Query(e),
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Error raised while loading or reading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failure inside the layered configuration sources
    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),

    /// A value is present but unusable
    #[error("Invalid configuration value for '{key}': {message}")]
    Invalid { key: String, message: String },
}

/// Type alias for Result with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error raised while resolving a service from the container
#[derive(Error, Debug)]
pub enum ContainerError {
    /// No descriptor exists for the requested service type
    #[error("No service registered for type {0}")]
    NotRegistered(&'static str),

    /// The factory for a registered service failed
    #[error("Failed to construct {service}: {message}")]
    Construction {
        service: &'static str,
        message: String,
    },
}

impl ContainerError {
    /// Build a construction error for service type `T`
    pub fn construction<T: ?Sized>(message: impl std::fmt::Display) -> Self {
        ContainerError::Construction {
            service: std::any::type_name::<T>(),
            message: message.to_string(),
        }
    }
}

/// Type alias for Result with ContainerError
pub type ContainerResult<T> = Result<T, ContainerError>;
