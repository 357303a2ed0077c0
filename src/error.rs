//! Error types for the staffing portal.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the portal can report, from configuration loading
//! through persistence and request validation.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the staffing portal.
///
/// Library operations return this error type so that the HTTP layer can map
/// each variant onto a single status code.
///
/// # Example
///
/// ```
/// use staffing_portal::error::PortalError;
///
/// let error = PortalError::ConfigNotFound {
///     path: "/missing/portal.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/portal.yaml");
/// ```
#[derive(Debug, Error)]
pub enum PortalError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or failed validation.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No attendance policy is in effect on the given date.
    #[error("No attendance policy in effect on {date}")]
    PolicyNotFound {
        /// The date for which a policy was requested.
        date: NaiveDate,
    },

    /// A requested record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The kind of record (e.g. "candidate").
        entity: &'static str,
        /// The identifier that was looked up.
        id: i64,
    },

    /// Input failed validation.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// The caller is not authenticated.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Why authentication failed.
        message: String,
    },

    /// The caller is authenticated but lacks the required role or ownership.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Why access was denied.
        message: String,
    },

    /// The request conflicts with existing state.
    #[error("Conflict: {message}")]
    Conflict {
        /// A description of the conflict.
        message: String,
    },

    /// A stored column held a value the portal does not recognise.
    #[error("Corrupt record: column '{column}' holds unexpected value '{value}'")]
    CorruptRecord {
        /// The column name.
        column: String,
        /// The raw stored value.
        value: String,
    },

    /// A bulk import could not be processed.
    #[error("Import failed at line {line}: {message}")]
    Import {
        /// The 1-based line number in the input.
        line: usize,
        /// A description of the failure.
        message: String,
    },

    /// Database driver error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PortalError {
    /// Shorthand for a [`PortalError::Validation`].
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PortalError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`PortalError::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        PortalError::Forbidden {
            message: message.into(),
        }
    }

    /// Shorthand for a [`PortalError::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        PortalError::Unauthorized {
            message: message.into(),
        }
    }
}

/// A type alias for Results that return PortalError.
pub type PortalResult<T> = Result<T, PortalError>;
