//! Error types for serializers and the serializing producer/consumer.
//!
//! ## Error Handling Strategy
//!
//! - [`SerializerError`] is the single error surface of every serializer,
//!   whichever internal step failed (codec, framing, registry, encoding).
//! - [`ClientError`] wraps serializer failures with the context needed to act
//!   on them: which side of the record failed on the write path, and where
//!   the record lives on the read path.
//!
//! Nothing here is retried internally; retry policy belongs to the caller.

use crate::context::MessageField;
use crate::transport::TransportError;
use streamhouse_schema_registry::{RegistryError, WireFormatError};
use thiserror::Error;

/// Convenience type alias for `Result<T, ClientError>`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure inside a single serialize or deserialize call.
#[derive(Debug, Error)]
pub enum SerializerError {
    /// Fixed-width or text conversion failed (wrong length, invalid encoding).
    #[error("Failed to convert {type_name}: {message}")]
    Codec {
        type_name: &'static str,
        message: String,
    },

    /// Wire header missing or invalid. Fatal for the message.
    #[error("Malformed wire payload: {0}")]
    MalformedPayload(#[from] WireFormatError),

    /// Schema lookup or registration failed.
    ///
    /// See [`RegistryError::is_not_found`] and
    /// [`RegistryError::is_unavailable`] to tell the kinds apart.
    #[error("Schema registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Reader schema cannot be reconciled with the writer schema.
    #[error("Reader schema is incompatible with writer schema {writer_id}: {message}")]
    SchemaIncompatible { writer_id: i32, message: String },

    /// No schema to serialize with, or an option the serializer cannot honor.
    #[error("Serialization configuration error: {0}")]
    Config(String),

    /// Avro encoding or decoding failed.
    #[error("Avro encoding error: {0}")]
    Encoding(String),

    /// Converter hook failed.
    #[error("Record conversion failed: {0}")]
    Conversion(String),
}

impl SerializerError {
    pub(crate) fn codec(type_name: &'static str, message: impl Into<String>) -> Self {
        SerializerError::Codec {
            type_name,
            message: message.into(),
        }
    }
}

/// Error type for the serializing producer and consumer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Key could not be serialized; nothing was sent.
    #[error("Key serialization failed: {0}")]
    KeySerialization(#[source] SerializerError),

    /// Value could not be serialized; nothing was sent.
    #[error("Value serialization failed: {0}")]
    ValueSerialization(#[source] SerializerError),

    /// A polled record could not be deserialized.
    #[error(
        "Message deserialization failed for message at {topic} [{partition}] offset {offset} ({field}): {source}"
    )]
    Deserialization {
        topic: String,
        partition: u32,
        offset: u64,
        field: MessageField,
        #[source]
        source: SerializerError,
    },

    /// The transport failed to send or poll.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Which side of the record failed, if a serializer failed.
    pub fn field(&self) -> Option<MessageField> {
        match self {
            ClientError::KeySerialization(_) => Some(MessageField::Key),
            ClientError::ValueSerialization(_) => Some(MessageField::Value),
            ClientError::Deserialization { field, .. } => Some(*field),
            ClientError::Transport(_) => None,
        }
    }

    /// The underlying serializer failure, if any.
    pub fn serializer_error(&self) -> Option<&SerializerError> {
        match self {
            ClientError::KeySerialization(e) | ClientError::ValueSerialization(e) => Some(e),
            ClientError::Deserialization { source, .. } => Some(source),
            ClientError::Transport(_) => None,
        }
    }
}
