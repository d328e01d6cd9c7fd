//! Unified error type for shipdesk.
//!
//! Every core operation returns [`Result`]. Callers that need to pick a response
//! code use [`Error::kind`], which folds the variants into the small set of
//! failure kinds the outer layer understands.

use sea_orm::DbErr;
use thiserror::Error;

/// Errors raised by the order lifecycle, privilege engine and lookup CRUD.
#[derive(Debug, Error)]
pub enum Error {
    /// Referenced row does not exist or is already soft-deleted
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Human-readable entity name (e.g. "Order", "Driver")
        entity: &'static str,
        /// The identifier the caller used
        id: String,
    },

    /// Precondition or input validation failed
    #[error("Bad request: {message}")]
    BadRequest {
        /// Short explanation for the caller
        message: String,
    },

    /// A uniqueness-constrained name is already taken
    #[error("{entity} already exists: {name}")]
    Duplicate {
        /// Human-readable entity name
        entity: &'static str,
        /// The conflicting value
        name: String,
    },

    /// A multi-step write failed and was rolled back
    #[error("Transaction failed: {message}")]
    Transaction {
        /// Operation name and underlying cause
        message: String,
    },

    /// Single-statement datastore error
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure classification for the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or soft-deleted entity
    NotFound,
    /// Invalid input, duplicate name or violated state precondition
    BadRequest,
    /// Datastore failure during a write
    TransactionFailure,
    /// Startup/configuration failure
    Internal,
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`Error::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Rewrites raw datastore failures from a multi-step write as
    /// [`Error::Transaction`], leaving domain errors untouched.
    #[must_use]
    pub fn in_transaction(self, operation: &str) -> Self {
        match self {
            Self::Database(e) => Self::Transaction {
                message: format!("Error {operation}: {e}"),
            },
            other => other,
        }
    }

    /// Classifies this error for the request boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::BadRequest { .. } | Self::Duplicate { .. } => ErrorKind::BadRequest,
            Self::Transaction { .. } | Self::Database(_) => ErrorKind::TransactionFailure,
            Self::Config { .. } | Self::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
