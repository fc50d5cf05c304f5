//! Transport seam for the serializing producer and consumer.
//!
//! The wrappers only ever see payload bytes going out through a [`Transport`]
//! and coming back from a [`RecordSource`]. [`InMemoryTransport`] implements
//! both as a loopback log for tests and local tooling.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::trace;

/// Sent records kept by [`InMemoryTransport`] unless configured otherwise.
pub const DEFAULT_SENT_HISTORY: usize = 1024;

/// Transport-level failure, as reported by the messaging client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Reached end of {topic} [{partition}] at offset {offset}")]
    PartitionEof {
        topic: String,
        partition: u32,
        offset: u64,
    },

    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Transport closed")]
    Closed,
}

/// Per-send options passed through to the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    /// Explicit partition; the transport picks one otherwise.
    pub partition: Option<u32>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: Option<u64>,
    pub headers: Vec<(String, Bytes)>,
}

/// A record with serialized key and value, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRecord {
    pub topic: String,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
    pub options: SendOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
}

/// A record as polled from the transport, before deserialization.
///
/// `error` is set when the transport reports a record-level failure instead
/// of data.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub timestamp: Option<u64>,
    pub headers: Vec<(String, Bytes)>,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
    pub error: Option<TransportError>,
}

/// A deserialized record.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedRecord<K, V> {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub timestamp: Option<u64>,
    pub headers: Vec<(String, Bytes)>,
    pub key: Option<K>,
    pub value: Option<V>,
}

/// Outcome of a successful poll.
#[derive(Debug, Clone, PartialEq)]
pub enum Message<K, V> {
    Record(ConsumedRecord<K, V>),
    /// Transport error record, passed through undeserialized.
    Error(RawRecord),
}

impl<K, V> Message<K, V> {
    pub fn is_error(&self) -> bool {
        matches!(self, Message::Error(_))
    }

    pub fn into_record(self) -> Option<ConsumedRecord<K, V>> {
        match self {
            Message::Record(record) => Some(record),
            Message::Error(_) => None,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, record: OutgoingRecord) -> Result<DeliveryReport, TransportError>;
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Wait up to `timeout` for the next record.
    async fn poll(&self, timeout: Duration) -> Result<Option<RawRecord>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, record: OutgoingRecord) -> Result<DeliveryReport, TransportError> {
        (**self).send(record).await
    }
}

#[async_trait]
impl<S: RecordSource + ?Sized> RecordSource for Arc<S> {
    async fn poll(&self, timeout: Duration) -> Result<Option<RawRecord>, TransportError> {
        (**self).poll(timeout).await
    }
}

struct LoopbackState {
    queue: VecDeque<RawRecord>,
    next_offsets: HashMap<(String, u32), u64>,
    sent: VecDeque<OutgoingRecord>,
    sent_limit: usize,
    sent_total: usize,
    send_error: Option<TransportError>,
}

/// Loopback transport: everything sent becomes pollable, in send order.
///
/// Records default to partition 0; offsets are sequential per partition.
/// Only the last [`DEFAULT_SENT_HISTORY`] sent records are kept for
/// inspection; the poll queue itself is drained by consumers.
pub struct InMemoryTransport {
    state: Mutex<LoopbackState>,
    notify: Notify,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_SENT_HISTORY)
    }

    /// Keep at most `limit` sent records; older ones are dropped first.
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            state: Mutex::new(LoopbackState {
                queue: VecDeque::new(),
                next_offsets: HashMap::new(),
                sent: VecDeque::new(),
                sent_limit: limit,
                sent_total: 0,
                send_error: None,
            }),
            notify: Notify::new(),
        }
    }

    /// Most recent records accepted by [`Transport::send`], oldest first.
    pub async fn sent(&self) -> Vec<OutgoingRecord> {
        self.state.lock().await.sent.iter().cloned().collect()
    }

    /// Total records accepted, including ones evicted from the history.
    pub async fn sent_count(&self) -> usize {
        self.state.lock().await.sent_total
    }

    /// Fail every send with `error` until cleared with `None`.
    pub async fn fail_sends(&self, error: Option<TransportError>) {
        self.state.lock().await.send_error = error;
    }

    /// Append a raw record to the poll queue.
    ///
    /// The record's offset is assigned by the loopback log.
    pub async fn push(&self, mut record: RawRecord) -> u64 {
        let mut state = self.state.lock().await;
        let offset = state.next_offset(&record.topic, record.partition);
        record.offset = offset;
        state.queue.push_back(record);
        drop(state);
        self.notify.notify_one();
        offset
    }

    /// Queue a record-level transport error for `topic`.
    pub async fn push_error(&self, topic: &str, partition: u32, error: TransportError) {
        let mut state = self.state.lock().await;
        let offset = state
            .next_offsets
            .get(&(topic.to_string(), partition))
            .copied()
            .unwrap_or(0);
        state.queue.push_back(RawRecord {
            topic: topic.to_string(),
            partition,
            offset,
            timestamp: None,
            headers: Vec::new(),
            key: None,
            value: None,
            error: Some(error),
        });
        drop(state);
        self.notify.notify_one();
    }
}

impl LoopbackState {
    fn next_offset(&mut self, topic: &str, partition: u32) -> u64 {
        let next = self
            .next_offsets
            .entry((topic.to_string(), partition))
            .or_insert(0);
        let offset = *next;
        *next += 1;
        offset
    }

    fn record_sent(&mut self, record: OutgoingRecord) {
        self.sent_total += 1;
        if self.sent_limit == 0 {
            return;
        }
        if self.sent.len() == self.sent_limit {
            self.sent.pop_front();
        }
        self.sent.push_back(record);
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, record: OutgoingRecord) -> Result<DeliveryReport, TransportError> {
        let mut state = self.state.lock().await;
        if let Some(error) = &state.send_error {
            return Err(error.clone());
        }

        let partition = record.options.partition.unwrap_or(0);
        let offset = state.next_offset(&record.topic, partition);

        trace!(
            topic = %record.topic,
            partition = partition,
            offset = offset,
            "Loopback record appended"
        );

        state.queue.push_back(RawRecord {
            topic: record.topic.clone(),
            partition,
            offset,
            timestamp: record.options.timestamp,
            headers: record.options.headers.clone(),
            key: record.key.clone(),
            value: record.value.clone(),
            error: None,
        });
        let report = DeliveryReport {
            topic: record.topic.clone(),
            partition,
            offset,
        };
        state.record_sent(record);
        drop(state);

        self.notify.notify_one();
        Ok(report)
    }
}

#[async_trait]
impl RecordSource for InMemoryTransport {
    async fn poll(&self, timeout: Duration) -> Result<Option<RawRecord>, TransportError> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register before checking the queue so a send in between still
            // wakes us. A stored permit may wake us with nothing queued.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(record) = self.state.lock().await.queue.pop_front() {
                return Ok(Some(record));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outgoing(topic: &str, value: &'static [u8]) -> OutgoingRecord {
        OutgoingRecord {
            topic: topic.to_string(),
            key: None,
            value: Some(Bytes::from_static(value)),
            options: SendOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_loopback_offsets() {
        let transport = InMemoryTransport::new();

        let first = transport.send(outgoing("orders", b"a")).await.unwrap();
        let second = transport.send(outgoing("orders", b"b")).await.unwrap();
        let other = transport.send(outgoing("payments", b"c")).await.unwrap();

        assert_eq!((first.partition, first.offset), (0, 0));
        assert_eq!(second.offset, 1);
        assert_eq!(other.offset, 0);
        assert_eq!(transport.sent_count().await, 3);

        let polled = transport
            .poll(Duration::from_millis(10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(polled.value.as_deref(), Some(&b"a"[..]));
    }

    #[tokio::test]
    async fn test_poll_times_out_when_empty() {
        let transport = InMemoryTransport::new();
        let polled = transport.poll(Duration::from_millis(10)).await.unwrap();
        assert!(polled.is_none());
    }

    #[tokio::test]
    async fn test_poll_wakes_on_send() {
        let transport = Arc::new(InMemoryTransport::new());

        let poller = {
            let transport = transport.clone();
            tokio::spawn(async move { transport.poll(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        transport.send(outgoing("orders", b"late")).await.unwrap();

        let polled = poller.await.unwrap().unwrap();
        assert_eq!(polled.unwrap().value.as_deref(), Some(&b"late"[..]));
    }

    #[tokio::test]
    async fn test_poll_waits_after_earlier_traffic() {
        let transport = Arc::new(InMemoryTransport::new());

        transport.send(outgoing("orders", b"early")).await.unwrap();
        let early = transport.poll(Duration::from_millis(10)).await.unwrap();
        assert_eq!(early.unwrap().value.as_deref(), Some(&b"early"[..]));

        let sender = {
            let transport = transport.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                transport.send(outgoing("orders", b"late")).await.unwrap();
            })
        };

        let late = transport.poll(Duration::from_secs(2)).await.unwrap();
        assert_eq!(late.unwrap().value.as_deref(), Some(&b"late"[..]));
        sender.await.unwrap();
    }

    #[tokio::test]
    async fn test_sent_history_is_bounded() {
        let transport = InMemoryTransport::with_history_limit(2);

        for value in [b"a", b"b", b"c"] {
            transport.send(outgoing("orders", value)).await.unwrap();
        }

        let kept: Vec<_> = transport
            .sent()
            .await
            .into_iter()
            .map(|record| record.value.unwrap())
            .collect();
        assert_eq!(kept, vec![Bytes::from_static(b"b"), Bytes::from_static(b"c")]);
        assert_eq!(transport.sent_count().await, 3);

        // History eviction never touches the poll queue.
        let first = transport.poll(Duration::from_millis(10)).await.unwrap();
        assert_eq!(first.unwrap().value.as_deref(), Some(&b"a"[..]));
    }

    #[tokio::test]
    async fn test_send_failure() {
        let transport = InMemoryTransport::new();
        transport
            .fail_sends(Some(TransportError::Broker("leader not available".into())))
            .await;

        let err = transport.send(outgoing("orders", b"a")).await.unwrap_err();
        assert!(matches!(err, TransportError::Broker(_)));
        assert_eq!(transport.sent_count().await, 0);
    }
}
