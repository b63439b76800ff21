use std::fmt::Debug;

use crate::config::JoinConfig;
use crate::error::Result;
use crate::format::Format;
use crate::join::{Buffered, StreamTableJoin};
use crate::store::KVStore;
use crate::stream::topic::{RawProducer, TypedConsumer, TypedProducer};
use crate::stream::{KSink, KStream, StreamItem, TableTriggeredJoin};
use crate::Config;

pub mod punctuate;

/// Task is a base unit of computation,
/// Each task constitutes a consumer group.
/// Each task executes within a single thread, and everything it reads, stores
/// and writes is owned by that thread. Both sides of a join go through one
/// processor, so its stores need no locking.
pub struct Task<S> {
    cfg: Config,
    name: String,
    stream: S,
}

impl Task<()> {
    pub fn new(cfg: Config, name: &str) -> Self {
        Self {
            stream: (),
            cfg,
            name: name.to_string(),
        }
    }

    /// Reads a topic as the task's input.
    pub fn stream<KF: Format, VF: Format>(self, topic: &str) -> Result<Task<TypedConsumer<KF, VF>>> {
        let consumer = TypedConsumer::<KF, VF>::subscribe(&self.consumer_config(topic), topic)?;
        Ok(self.source(consumer))
    }

    /// Uses any stream as the task's input.
    pub fn source<S: KStream>(self, stream: S) -> Task<S> {
        Task {
            stream,
            cfg: self.cfg,
            name: self.name,
        }
    }
}

impl<S> Task<S> {
    fn consumer_config(&self, topic: &str) -> Config {
        self.cfg.clone().set_group(&format!("{}-{}", self.name, topic))
    }
}

impl<S: KStream> Task<S>
    where S::Key: Clone + Debug,
          S::Value: Debug
{
    /// Left-joins the task's stream with `table`, triggering join output from
    /// both sides. Stream records without table data wait up to
    /// `max_wait_per_record` of stream time before being sent with no table
    /// value. The two inputs are read in timestamp order.
    pub fn join_table<T, BS, TS>(self, table: T, join_cfg: &JoinConfig) -> Result<Task<TableTriggeredJoin<S, T, BS, TS>>>
        where T: KStream<Key = S::Key>,
              T::Value: Clone + Debug,
              BS: KVStore<S::Key, Buffered<S::Value>>,
              TS: KVStore<S::Key, T::Value>
    {
        let join = StreamTableJoin::<S::Key, S::Value, T::Value, BS, TS>::open(&self.cfg, join_cfg)?;
        info!("Task {} joins its stream with a table-triggered join", self.name);
        Ok(Task {
            stream: TableTriggeredJoin::new(self.stream, table, join, join_cfg.max_idle),
            cfg: self.cfg,
            name: self.name,
        })
    }

    /// Same as [`Task::join_table`], reading the table side from a topic.
    pub fn join_table_topic<KF, VF, BS, TS>(self, topic: &str, join_cfg: &JoinConfig) -> Result<Task<TableTriggeredJoin<S, TypedConsumer<KF, VF>, BS, TS>>>
        where KF: Format<Item = S::Key>,
              VF: Format,
              VF::Item: Clone + Debug,
              BS: KVStore<S::Key, Buffered<S::Value>>,
              TS: KVStore<S::Key, VF::Item>
    {
        let table = TypedConsumer::<KF, VF>::subscribe(&self.consumer_config(topic), topic)?;
        self.join_table(table, join_cfg)
    }
}

impl<S: KStream> Task<S> {
    /// Runs the task, writing every record to `sink` until the input ends.
    pub async fn to_sink<SK>(mut self, mut sink: SK) -> Result<()>
        where SK: KSink<Key = S::Key, Value = S::Value>
    {
        info!("Task {} sink enter", self.name);
        while let Some(item) = self.stream.next().await {
            match item {
                StreamItem::Rebalance(parts) => {
                    info!("Task {} now owns partitions {:?}", self.name, parts);
                }
                StreamItem::Item(record) => {
                    trace!("Task {} sinking record at {}", self.name, record.timestamp);
                    sink.send_record(&record).await?;
                }
            }
        }
        info!("Task {} input ended", self.name);
        Ok(())
    }

    /// Runs the task, producing every record to `topic`.
    pub async fn to<KF, VF>(self, topic: &str) -> Result<()>
        where KF: Format<Item = S::Key>,
              VF: Format<Item = S::Value>
    {
        let sink = TypedProducer::<KF, VF>::from(RawProducer::new(&self.cfg, topic)?);
        self.to_sink(sink).await
    }
}
