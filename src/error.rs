//! Error taxonomy for the store.
//!
//! Every public store operation returns [`StoreError`]. Raw `rusqlite` errors are
//! classified on conversion so callers can tell a constraint violation from an
//! interrupted statement from a generic engine failure.

use rusqlite::ErrorCode;

use crate::store::StoreState;

/// Errors returned by [`Store`](crate::store::Store) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Opening the database or applying the schema failed. The store is unusable.
    #[error("failed to open store at {path}: {source}")]
    Connection {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A single-row lookup matched nothing.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Uniqueness, referential-integrity or CHECK violation.
    #[error("constraint violation: {0}")]
    Constraint(#[source] rusqlite::Error),

    /// Embedding dimension mismatch or a malformed encoded value.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The caller's cancellation token fired before or during the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Any other engine-level failure (I/O, corruption, malformed SQL).
    #[error("storage error: {0}")]
    Storage(#[source] rusqlite::Error),

    /// The store is not in a state that permits the requested action.
    #[error("cannot {action}: store is {state}")]
    Usage {
        action: &'static str,
        state: StoreState,
    },
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn connection(
        path: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Connection {
            path: path.into(),
            source: source.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => Self::Constraint(err),
            Some(ErrorCode::OperationInterrupted) => Self::Cancelled,
            _ => Self::Storage(err),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias used throughout the store.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
