//! Schema Registry Error Types
//!
//! Errors are `Clone` so that a single failed round-trip can be handed to
//! every caller waiting on the same cache entry.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Schema registry unavailable: {0}")]
    Unavailable(String),

    #[error("Schema registry request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Schema registry rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid registry response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// True for ids or subjects the registry does not know.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::SchemaNotFound(_) | RegistryError::SubjectNotFound(_)
        )
    }

    /// True when the registry could not be reached in time.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, RegistryError::Unavailable(_) | RegistryError::Timeout(_))
    }
}

/// Malformed wire payload (missing or invalid header).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireFormatError {
    #[error("Payload too short to contain schema ID: {0} bytes")]
    TooShort(usize),

    #[error("Invalid magic byte: expected 0x00, got 0x{0:02x}")]
    InvalidMagicByte(u8),
}
