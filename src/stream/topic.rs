use std::marker::PhantomData;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::producer::{FutureProducer, FutureRecord};

use crate::error::{Error, Result};
use crate::format::Format;
use crate::stream::{KSink, KStream, Record, StreamItem, Timestamp};
use crate::Config;

const PRODUCE_QUEUE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RawConsumer {
    topic: String,
    base: BaseConsumer,
    assigned: Vec<i32>,
}

impl RawConsumer {
    pub fn subscribe(config: &Config, topic: &str) -> Result<Self> {
        let base: BaseConsumer = config.0.create()?;
        base.subscribe(&[topic])?;
        debug!("Subscribed to {}", topic);
        Ok(Self {
            topic: topic.to_string(),
            base,
            assigned: Vec::new(),
        })
    }

    // The consumer group may move partitions at any poll
    fn assignment_changed(&mut self) -> Option<Vec<i32>> {
        let list = match self.base.assignment() {
            Ok(list) => list,
            Err(e) => {
                warn!("Could not read assignment of {}: {}", self.topic, e);
                return None;
            }
        };
        let mut parts: Vec<i32> = list
            .elements_for_topic(&self.topic)
            .iter()
            .map(|p| p.partition())
            .collect();
        parts.sort_unstable();
        if parts == self.assigned {
            return None;
        }
        self.assigned = parts.clone();
        Some(parts)
    }

    pub async fn poll_next<KF: Format, VF: Format>(&mut self) -> StreamItem<KF::Item, VF::Item> {
        loop {
            if let Some(parts) = self.assignment_changed() {
                return StreamItem::Rebalance(parts);
            }
            match self.base.poll(Duration::ZERO) {
                Some(Ok(message)) => match decode::<KF, VF>(&message) {
                    Ok(record) => return StreamItem::Item(record),
                    Err(e) => {
                        warn!("Skipping undecodable record on {} at offset {}: {}", self.topic, message.offset(), e);
                    }
                },
                Some(Err(e)) => {
                    error!("Consumer error on {}: {}", self.topic, e);
                }
                None => {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        }
    }
}

fn decode<KF: Format, VF: Format>(message: &BorrowedMessage<'_>) -> Result<Record<KF::Item, VF::Item>> {
    let key = KF::deserialize(message.key().unwrap_or_default())?;
    let value = message.payload().map(VF::deserialize).transpose()?;
    let timestamp = message.timestamp().to_millis().unwrap_or_else(wall_clock);
    Ok(Record {
        partition: Some(message.partition()),
        key,
        value,
        timestamp,
    })
}

fn wall_clock() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or_default()
}

pub struct TypedConsumer<KF, VF> {
    pub(crate) raw: RawConsumer,
    pub(crate) _marker: PhantomData<(KF, VF)>,
}

impl<KF: Format, VF: Format> TypedConsumer<KF, VF> {
    pub fn subscribe(config: &Config, topic: &str) -> Result<Self> {
        Ok(TypedConsumer {
            raw: RawConsumer::subscribe(config, topic)?,
            _marker: PhantomData,
        })
    }
}

#[async_trait(?Send)]
impl<KF, VF> KStream for TypedConsumer<KF, VF>
    where KF: Format, VF: Format
{
    type Key = KF::Item;
    type Value = VF::Item;

    async fn next(&mut self) -> Option<StreamItem<Self::Key, Self::Value>> {
        Some(self.raw.poll_next::<KF, VF>().await)
    }
}

pub struct RawProducer {
    topic: String,
    base: FutureProducer,
}

impl RawProducer {
    pub fn new(config: &Config, topic: &str) -> Result<Self> {
        let base: FutureProducer = config.0.create()?;
        Ok(RawProducer {
            topic: topic.to_string(),
            base,
        })
    }

    pub async fn send<KF: Format, VF: Format>(&self, part: Option<i32>, k: &KF::Item, v: Option<&VF::Item>) -> Result<()> {
        self.send_at::<KF, VF>(part, k, v, None).await
    }

    /// Sends with an explicit record timestamp instead of the broker's.
    pub async fn send_at<KF: Format, VF: Format>(&self, part: Option<i32>, k: &KF::Item, v: Option<&VF::Item>, timestamp: Option<Timestamp>) -> Result<()> {
        let key = KF::serialize(k)?;
        let payload = v.map(VF::serialize).transpose()?;

        let mut rec: FutureRecord<'_, [u8], [u8]> = FutureRecord::to(&self.topic).key(&key[..]);
        if let Some(payload) = &payload {
            rec = rec.payload(&payload[..]);
        }
        if let Some(part) = part {
            rec = rec.partition(part);
        }
        if let Some(timestamp) = timestamp {
            rec = rec.timestamp(timestamp);
        }

        let (part, offset) = self
            .base
            .send(rec, PRODUCE_QUEUE_TIMEOUT)
            .await
            .map_err(|(e, _)| Error::Kafka(e))?;
        trace!("Produced to {}/{} at offset {}", self.topic, part, offset);
        Ok(())
    }
}

pub struct TypedProducer<KF, VF> {
    pub(crate) raw: RawProducer,
    keep_partitions: bool,
    pub(crate) _marker: PhantomData<(KF, VF)>,
}

impl<KF: Format, VF: Format> TypedProducer<KF, VF> {
    pub async fn send_at(&self, k: &KF::Item, v: Option<&VF::Item>, timestamp: Timestamp) -> Result<()> {
        self.raw.send_at::<KF, VF>(None, k, v, Some(timestamp)).await
    }

    /// Sends records to the partition they were read from instead of
    /// partitioning them by key. The output topic needs at least as many
    /// partitions as the inputs.
    pub fn keep_partitions(mut self) -> Self {
        self.keep_partitions = true;
        self
    }

    fn partition_for<V>(&self, record: &Record<KF::Item, V>) -> Option<i32> {
        if self.keep_partitions {
            record.partition
        } else {
            None
        }
    }
}

impl<KF, VF> From<RawProducer> for TypedProducer<KF, VF> {
    fn from(p: RawProducer) -> Self {
        Self {
            raw: p,
            keep_partitions: false,
            _marker: PhantomData,
        }
    }
}

#[async_trait(?Send)]
impl<KF, VF> KSink for TypedProducer<KF, VF>
    where KF: Format, VF: Format
{
    type Key = KF::Item;
    type Value = VF::Item;

    async fn send_next(&mut self, part: Option<i32>, k: &Self::Key, v: Option<&Self::Value>) -> Result<()> {
        self.raw.send::<KF, VF>(part, k, v).await
    }

    async fn send_record(&mut self, record: &Record<Self::Key, Self::Value>) -> Result<()> {
        let part = self.partition_for(record);
        self.raw
            .send_at::<KF, VF>(part, &record.key, record.value.as_ref(), Some(record.timestamp))
            .await
    }
}
