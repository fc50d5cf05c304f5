//! Serializing producer
//!
//! Serializes the key and then the value of each record before handing the
//! bytes to a [`Transport`]. A serialization failure aborts the send: the
//! transport is never called with a partially serialized record.
//!
//! ## Example
//!
//! ```ignore
//! let producer = SerializingProducer::new(transport, key_serializer, value_serializer);
//!
//! let report = producer
//!     .send(ProducerRecord::new("orders").key(&order_id).value(&order))
//!     .await?;
//! ```

use crate::context::SerializationContext;
use crate::error::{ClientError, Result};
use crate::serializer::Serializer;
use crate::transport::{DeliveryReport, OutgoingRecord, SendOptions, Transport};
use bytes::Bytes;
use streamhouse_schema_registry::Schema;
use tracing::{debug, warn};

/// A record to send, borrowing its key, value and schema overrides.
pub struct ProducerRecord<'a, K, V> {
    topic: &'a str,
    key: Option<&'a K>,
    value: Option<&'a V>,
    key_schema: Option<&'a Schema>,
    value_schema: Option<&'a Schema>,
    options: SendOptions,
}

impl<'a, K, V> ProducerRecord<'a, K, V> {
    pub fn new(topic: &'a str) -> Self {
        Self {
            topic,
            key: None,
            value: None,
            key_schema: None,
            value_schema: None,
            options: SendOptions::default(),
        }
    }

    pub fn key(mut self, key: &'a K) -> Self {
        self.key = Some(key);
        self
    }

    pub fn value(mut self, value: &'a V) -> Self {
        self.value = Some(value);
        self
    }

    /// Key schema for this record only.
    pub fn key_schema(mut self, schema: &'a Schema) -> Self {
        self.key_schema = Some(schema);
        self
    }

    /// Value schema for this record only.
    pub fn value_schema(mut self, schema: &'a Schema) -> Self {
        self.value_schema = Some(schema);
        self
    }

    pub fn partition(mut self, partition: u32) -> Self {
        self.options.partition = Some(partition);
        self
    }

    pub fn timestamp(mut self, timestamp_ms: u64) -> Self {
        self.options.timestamp = Some(timestamp_ms);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.options.headers.push((name.into(), value.into()));
        self
    }
}

/// Producer that serializes keys and values before sending.
pub struct SerializingProducer<KS, VS, T> {
    transport: T,
    key_serializer: KS,
    value_serializer: VS,
}

impl<KS, VS, T> SerializingProducer<KS, VS, T>
where
    KS: Serializer,
    VS: Serializer,
    T: Transport,
{
    pub fn new(transport: T, key_serializer: KS, value_serializer: VS) -> Self {
        Self {
            transport,
            key_serializer,
            value_serializer,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Serialize and send one record.
    ///
    /// # Errors
    ///
    /// - [`ClientError::KeySerialization`]: the key failed; the value was not
    ///   serialized and nothing was sent
    /// - [`ClientError::ValueSerialization`]: the value failed; nothing was sent
    /// - [`ClientError::Transport`]: the transport rejected the record
    pub async fn send(
        &self,
        record: ProducerRecord<'_, KS::Value, VS::Value>,
    ) -> Result<DeliveryReport> {
        let topic = record.topic;

        let key = self
            .key_serializer
            .serialize_with_schema(record.key_schema, record.key, &SerializationContext::key(topic))
            .await
            .map_err(|e| {
                warn!(topic = topic, error = %e, "Key serialization failed");
                ClientError::KeySerialization(e)
            })?;

        let value = self
            .value_serializer
            .serialize_with_schema(
                record.value_schema,
                record.value,
                &SerializationContext::value(topic),
            )
            .await
            .map_err(|e| {
                warn!(topic = topic, error = %e, "Value serialization failed");
                ClientError::ValueSerialization(e)
            })?;

        let report = self
            .transport
            .send(OutgoingRecord {
                topic: topic.to_string(),
                key,
                value,
                options: record.options,
            })
            .await?;

        debug!(
            topic = topic,
            partition = report.partition,
            offset = report.offset,
            "Record sent"
        );

        Ok(report)
    }
}
