//! Unified error types for the Cobalt engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the Cobalt engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller passed an argument outside the accepted range. Indicates a
    /// programming or registry-authoring bug and is never silently defaulted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A metric/report configuration is unset, unsupported, or incoherent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Stored bytes for a single row failed to deserialize. Fatal for that
    /// row only; sibling rows are unaffected.
    #[error("corrupt stored data: {0}")]
    Corruption(String),

    /// The storage collaborator failed.
    #[error("store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error aborts a single row/event rather than the whole
    /// operation it occurred in.
    pub fn is_row_scoped(&self) -> bool {
        matches!(self, Self::Corruption(_))
    }
}
