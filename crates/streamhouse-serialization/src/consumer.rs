//! Deserializing consumer
//!
//! Polls raw records from a [`RecordSource`] and deserializes the value and
//! then the key. Failures carry the topic, partition and offset of the
//! offending record so the caller can skip or dead-letter it. Transport error
//! records are returned as [`Message::Error`] without being deserialized.

use crate::context::{MessageField, SerializationContext};
use crate::error::{ClientError, Result, SerializerError};
use crate::serializer::Serializer;
use crate::transport::{ConsumedRecord, Message, RawRecord, RecordSource};
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Messages drained by [`DeserializingConsumer::consume`].
///
/// `messages` holds every record decoded before `error`, in poll order.
#[derive(Debug)]
pub struct ConsumedBatch<K, V> {
    pub messages: Vec<Message<K, V>>,
    /// Failure that ended the batch early, if any.
    pub error: Option<ClientError>,
}

impl<K, V> ConsumedBatch<K, V> {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The decoded messages, or the error if the batch ended early.
    ///
    /// Drops the decoded prefix on error; inspect the fields to keep it.
    pub fn into_result(self) -> Result<Vec<Message<K, V>>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.messages),
        }
    }
}

/// Consumer that deserializes keys and values after polling.
pub struct DeserializingConsumer<KS, VS, S> {
    source: S,
    key_deserializer: KS,
    value_deserializer: VS,
}

impl<KS, VS, S> DeserializingConsumer<KS, VS, S>
where
    KS: Serializer,
    VS: Serializer,
    S: RecordSource,
{
    pub fn new(source: S, key_deserializer: KS, value_deserializer: VS) -> Self {
        Self {
            source,
            key_deserializer,
            value_deserializer,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Poll one record, waiting up to `timeout`.
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Deserialization`]: the key or value of the polled
    ///   record could not be deserialized
    /// - [`ClientError::Transport`]: polling itself failed
    pub async fn poll(&self, timeout: Duration) -> Result<Option<Message<KS::Value, VS::Value>>> {
        let Some(raw) = self.source.poll(timeout).await? else {
            return Ok(None);
        };

        if raw.error.is_some() {
            return Ok(Some(Message::Error(raw)));
        }

        self.decode(raw).await.map(|record| Some(Message::Record(record)))
    }

    /// Poll until `max` messages arrived or `timeout` elapsed.
    ///
    /// Stops at the first failure. Messages decoded before it stay in the
    /// batch and the failure is reported in [`ConsumedBatch::error`]; the
    /// failed record has already been consumed from the source.
    pub async fn consume(
        &self,
        max: usize,
        timeout: Duration,
    ) -> ConsumedBatch<KS::Value, VS::Value> {
        let deadline = Instant::now() + timeout;
        let mut batch = ConsumedBatch {
            messages: Vec::with_capacity(max),
            error: None,
        };

        while batch.messages.len() < max {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.poll(remaining).await {
                Ok(Some(message)) => batch.messages.push(message),
                Ok(None) => break,
                Err(error) => {
                    batch.error = Some(error);
                    break;
                }
            }
        }

        batch
    }

    async fn decode(&self, raw: RawRecord) -> Result<ConsumedRecord<KS::Value, VS::Value>> {
        let value = self
            .value_deserializer
            .deserialize(raw.value.as_deref(), &SerializationContext::value(&raw.topic))
            .await
            .map_err(|e| located(&raw, MessageField::Value, e))?;

        let key = self
            .key_deserializer
            .deserialize(raw.key.as_deref(), &SerializationContext::key(&raw.topic))
            .await
            .map_err(|e| located(&raw, MessageField::Key, e))?;

        Ok(ConsumedRecord {
            topic: raw.topic,
            partition: raw.partition,
            offset: raw.offset,
            timestamp: raw.timestamp,
            headers: raw.headers,
            key,
            value,
        })
    }
}

fn located(raw: &RawRecord, field: MessageField, source: SerializerError) -> ClientError {
    warn!(
        topic = %raw.topic,
        partition = raw.partition,
        offset = raw.offset,
        field = %field,
        error = %source,
        "Message deserialization failed"
    );
    ClientError::Deserialization {
        topic: raw.topic.clone(),
        partition: raw.partition,
        offset: raw.offset,
        field,
        source,
    }
}
