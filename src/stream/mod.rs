use futures::StreamExt;

use crate::error::Result;

pub mod join;
pub mod merge;
pub mod topic;

pub use join::TableTriggeredJoin;
pub use merge::{Merge, Merged};

/// Logical time in milliseconds, as carried by Kafka record timestamps.
pub type Timestamp = i64;

#[derive(Debug, Clone, PartialEq)]
pub struct Record<K, V> {
    pub partition: Option<i32>,
    pub key: K,
    /// `None` is a null payload, which table-side inputs treat as a delete.
    pub value: Option<V>,
    pub timestamp: Timestamp,
}

impl<K, V> Record<K, V> {
    pub fn new(key: K, value: V, timestamp: Timestamp) -> Self {
        Record {
            partition: None,
            key,
            value: Some(value),
            timestamp,
        }
    }

    pub fn tombstone(key: K, timestamp: Timestamp) -> Self {
        Record {
            partition: None,
            key,
            value: None,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem<K, V> {
    Rebalance(Vec<i32>),
    Item(Record<K, V>),
}

/// KStream represents a stream of records
/// Each record having a timestamp
#[async_trait(?Send)]
pub trait KStream {
    type Key;
    type Value;

    /// Next item, or `None` once the stream has ended. Topic-backed streams
    /// never end.
    async fn next(&mut self) -> Option<StreamItem<Self::Key, Self::Value>>;
}

#[async_trait(?Send)]
pub trait KSink {
    type Key;
    type Value;

    async fn send_next(&mut self, part: Option<i32>, k: &Self::Key, v: Option<&Self::Value>) -> Result<()>;

    /// Sends a whole record. Sinks that can keep the record timestamp do so.
    async fn send_record(&mut self, record: &Record<Self::Key, Self::Value>) -> Result<()> {
        self.send_next(record.partition, &record.key, record.value.as_ref()).await
    }
}

/// Adapts any `futures::Stream` of records into a `KStream`.
pub struct Source<S> {
    inner: S,
}

impl<S> Source<S> {
    pub fn new(inner: S) -> Self {
        Source { inner }
    }
}

#[async_trait(?Send)]
impl<S, K, V> KStream for Source<S>
    where S: futures::Stream<Item = Record<K, V>> + Unpin
{
    type Key = K;
    type Value = V;

    async fn next(&mut self) -> Option<StreamItem<K, V>> {
        self.inner.next().await.map(StreamItem::Item)
    }
}
