//! StreamHouse Serialization
//!
//! Schema-aware serializers for message keys and values, and producer and
//! consumer wrappers that apply them around a byte-level transport.
//!
//! # Features
//!
//! - **Avro**: registry-backed encoding in the Confluent wire format, with
//!   reader-schema resolution and pluggable object converters
//! - **Primitives**: big-endian fixed-width numbers, text and raw bytes
//! - **Subject naming**: topic, topic-record and record strategies
//! - **Wrappers**: key-then-value serialization on send, value-then-key
//!   deserialization on poll with record coordinates on failure
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use streamhouse_schema_registry::{CachedSchemaRegistryClient, Schema, SchemaRegistryConfig};
//! use streamhouse_serialization::{AvroSerializer, ProducerRecord, SerializingProducer, StringSerializer};
//!
//! let registry = Arc::new(CachedSchemaRegistryClient::from_config(
//!     &SchemaRegistryConfig::new("http://localhost:8081"),
//! )?);
//! let values = AvroSerializer::new(registry).with_schema(Schema::parse(ORDER_SCHEMA)?);
//!
//! let producer = SerializingProducer::new(transport, StringSerializer::default(), values);
//! producer
//!     .send(ProducerRecord::new("orders").key(&order_id).value(&order))
//!     .await?;
//! ```

pub mod avro;
pub mod config;
pub mod consumer;
pub mod context;
pub mod converter;
pub mod error;
pub mod primitives;
pub mod producer;
pub mod serializer;
pub mod subject;
pub mod transport;

pub use avro::AvroSerializer;
pub use config::AvroClientConfig;
pub use consumer::{ConsumedBatch, DeserializingConsumer};
pub use context::{MessageField, SerializationContext};
pub use converter::{Converter, SerdeConverter, ValueConverter};
pub use error::{ClientError, Result, SerializerError};
pub use primitives::{
    BytesSerializer, DoubleSerializer, FloatSerializer, IntegerSerializer, LongSerializer,
    ShortSerializer, StringSerializer, TextEncoding,
};
pub use producer::{ProducerRecord, SerializingProducer};
pub use serializer::Serializer;
pub use subject::SubjectNameStrategy;
pub use transport::{
    ConsumedRecord, DeliveryReport, InMemoryTransport, Message, OutgoingRecord, RawRecord,
    RecordSource, SendOptions, Transport, TransportError,
};
