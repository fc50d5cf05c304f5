//! StreamHouse serde probe
//!
//! Registers the configured value schema (or a built-in probe schema) for a
//! topic. With the probe schema it also round-trips a sample record through
//! the Avro serializer and a loopback transport.
//!
//! # Usage
//!
//! ```bash
//! serde-probe <topic> [config.toml]
//! ```
//!
//! # Environment Variables
//!
//! - `SCHEMA_REGISTRY_URL`: registry URL when no config file is given
//!   (default: http://localhost:8081)
//! - `RUST_LOG`: Log level (default: info)

use anyhow::{bail, Context};
use apache_avro::types::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use streamhouse_schema_registry::{Schema, SchemaRegistryConfig};
use streamhouse_serialization::{
    AvroClientConfig, BytesSerializer, DeserializingConsumer, InMemoryTransport, Message,
    ProducerRecord, SerializationContext, SerializingProducer,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const PROBE_SCHEMA: &str =
    r#"{"type": "record", "name": "Probe", "namespace": "streamhouse", "fields": [{"name": "sequence", "type": "long"}]}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = std::env::args().skip(1);
    let Some(topic) = args.next() else {
        bail!("usage: serde-probe <topic> [config.toml]");
    };

    let config = match args.next() {
        Some(path) => AvroClientConfig::load(Path::new(&path))?,
        None => {
            let url = std::env::var("SCHEMA_REGISTRY_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string());
            AvroClientConfig::new(SchemaRegistryConfig::new(url))
        }
    };

    info!(
        registry = %config.schema_registry.url,
        topic = %topic,
        "serde-probe starting"
    );

    let registry = Arc::new(config.registry_client()?);
    let serializer = Arc::new(config.value_serializer(registry.clone())?);
    let probe_schema = Schema::parse(PROBE_SCHEMA)?;
    let schema = serializer.schema().unwrap_or(&probe_schema).clone();

    let subject = config
        .subject_name_strategy
        .subject_name(&SerializationContext::value(&topic), &schema);
    let schema_id = registry.register(&subject, &schema).await?;
    let latest = registry.get_latest_schema(&subject).await?;
    info!(
        subject = %subject,
        schema_id = schema_id,
        version = latest.version,
        "Schema registered"
    );

    if schema != probe_schema {
        info!("Configured value schema is not the probe schema, skipping round-trip");
        return Ok(());
    }

    let transport = Arc::new(InMemoryTransport::new());
    let producer =
        SerializingProducer::new(transport.clone(), BytesSerializer, serializer.clone());
    let consumer = DeserializingConsumer::new(transport, BytesSerializer, serializer);

    let sample = Value::Record(vec![("sequence".to_string(), Value::Long(1))]);
    let report = producer
        .send(
            ProducerRecord::new(&topic)
                .value(&sample)
                .value_schema(&probe_schema),
        )
        .await
        .context("failed to produce probe record")?;
    info!(offset = report.offset, "Probe record produced");

    match consumer.poll(Duration::from_secs(1)).await? {
        Some(Message::Record(record)) => {
            info!(value = ?record.value, "Probe record consumed");
        }
        Some(Message::Error(raw)) => {
            bail!("transport error at offset {}: {:?}", raw.offset, raw.error)
        }
        None => bail!("probe record was not delivered"),
    }

    Ok(())
}
