//! StreamHouse Schema Registry Client
//!
//! Resolves, registers and caches Avro schemas against a Confluent-compatible
//! schema registry, and frames schema-encoded payloads with the ID of the
//! schema that wrote them.
//!
//! # Features
//!
//! - **Caching**: ID -> schema and (subject, schema) -> ID, populated lazily
//!   and never evicted
//! - **Backends**: HTTP (Confluent REST API) and in-memory
//! - **Wire format**: `[0x00][schema_id: i32 BE][body]`
//!
//! # Usage
//!
//! ```ignore
//! use streamhouse_schema_registry::{CachedSchemaRegistryClient, Schema, SchemaRegistryConfig};
//!
//! let config = SchemaRegistryConfig::new("http://localhost:8081");
//! let registry = CachedSchemaRegistryClient::from_config(&config)?;
//!
//! let schema = Schema::parse(r#"{"type": "record", "name": "Order", "fields": [{"name": "amount", "type": "long"}]}"#)?;
//! let id = registry.register("orders-value", &schema).await?;
//!
//! // Answered from the cache
//! let same = registry.get_by_id(id).await?;
//! ```

pub mod backend;
pub mod client;
pub mod compatibility;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod schema;
pub mod types;
pub mod wire;

pub use backend::RegistryBackend;
pub use client::CachedSchemaRegistryClient;
pub use config::{CredentialsSource, SchemaRegistryConfig, TransportAuth};
pub use error::{RegistryError, Result, WireFormatError};
pub use http::HttpRegistryBackend;
pub use memory::MemoryRegistryBackend;
pub use schema::Schema;
pub use types::*;
pub use wire::{frame, unframe, HEADER_LEN, MAGIC_BYTE};
