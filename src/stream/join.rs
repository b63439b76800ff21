use std::collections::VecDeque;
use std::fmt::Debug;
use std::time::Duration;

use crate::join::{Buffered, Joined, JoinedRecord, StreamTableJoin};
use crate::store::KVStore;
use crate::stream::merge::{Merge, Merged};
use crate::stream::{KStream, Record, StreamItem};
use crate::table::Change;

type Pending<K, SV, TV> = VecDeque<Record<K, Joined<SV, TV>>>;

/// Stream-table join triggered from both sides.
///
/// Reads the stream side and the table side in timestamp order and feeds each
/// record to a single [`StreamTableJoin`]. Every output caused by one input
/// record is yielded in emission order before the next input is read, which
/// makes this stream the union of all trigger outputs.
pub struct TableTriggeredJoin<S, T, BS, TS>
    where S: KStream,
          T: KStream<Key = S::Key>
{
    inputs: Merge<S, T>,
    join: StreamTableJoin<S::Key, S::Value, T::Value, BS, TS>,
    pending: Pending<S::Key, S::Value, T::Value>,
}

impl<S, T, BS, TS> TableTriggeredJoin<S, T, BS, TS>
    where S: KStream,
          T: KStream<Key = S::Key>
{
    pub fn new(stream: S, table: T, join: StreamTableJoin<S::Key, S::Value, T::Value, BS, TS>, max_idle: Duration) -> Self {
        TableTriggeredJoin {
            inputs: Merge::new(stream, table, max_idle),
            join,
            pending: VecDeque::new(),
        }
    }

    pub fn processor(&self) -> &StreamTableJoin<S::Key, S::Value, T::Value, BS, TS> {
        &self.join
    }
}

fn enqueue<K, SV, TV>(pending: &mut Pending<K, SV, TV>, out: Vec<JoinedRecord<K, SV, TV>>, partition: Option<i32>) {
    pending.extend(out.into_iter().map(|joined| joined.into_record(partition)));
}

#[async_trait(?Send)]
impl<S, T, BS, TS> KStream for TableTriggeredJoin<S, T, BS, TS>
    where S: KStream,
          T: KStream<Key = S::Key>,
          S::Key: Clone + Debug,
          S::Value: Debug,
          T::Value: Clone + Debug,
          BS: KVStore<S::Key, Buffered<S::Value>>,
          TS: KVStore<S::Key, T::Value>
{
    type Key = S::Key;
    type Value = Joined<S::Value, T::Value>;

    async fn next(&mut self) -> Option<StreamItem<Self::Key, Self::Value>> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(StreamItem::Item(record));
            }
            let mut out = Vec::new();
            match self.inputs.next().await? {
                Merged::Rebalance(parts) => return Some(StreamItem::Rebalance(parts)),
                Merged::Left(Record { partition, key, value: Some(value), timestamp }) => {
                    self.join.process_stream(key, value, timestamp, &mut out);
                    enqueue(&mut self.pending, out, partition);
                }
                Merged::Left(Record { key, timestamp, .. }) => {
                    debug!("Dropping stream record with null value for key {:?} at {}", key, timestamp);
                }
                Merged::Right(Record { partition, key, value, timestamp }) => {
                    self.join.process_table(key, Change::from(value), timestamp, &mut out);
                    enqueue(&mut self.pending, out, partition);
                }
            }
        }
    }
}
