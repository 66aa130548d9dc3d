//! Unified error type for the tubedigest crates.
//!
//! Failures are grouped by how the pipeline reacts to them:
//! [`Error::is_transient`] errors skip the current item or batch and are retried
//! on the next cycle, [`Error::Format`] fails a single record, and
//! [`Error::is_fatal`] errors abort process startup.

use std::fmt;

/// Unified error type covering all failure modes in tubedigest.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "channel", "content").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Input data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A conflicting resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (yt-dlp) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description, usually the tool's stderr.
        message: String,
    },

    /// An external payload could not be parsed.
    #[error("Format error: {0}")]
    Format(String),

    /// An external service was unreachable or answered with a failure status.
    #[error("External service error [{service}]: {message}")]
    External {
        /// Name of the service (e.g. "youtube", "translator").
        service: String,
        /// Status and body, or the transport error.
        message: String,
    },

    /// A required credential or endpoint is missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation was abandoned because shutdown was requested.
    #[error("Operation cancelled")]
    Cancelled,

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the failure is expected to clear up on a later cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::External { .. } | Error::Tool { .. } | Error::Database { .. } | Error::Io { .. }
        )
    }

    /// Whether the failure must stop the process from starting.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::External`].
    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        Error::External {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Format`].
    pub fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
