//! Stream-table left join that can also be triggered from the table side.
//!
//! Kafka-style stream-table joins only produce output when a stream-side
//! record arrives. Here a stream-side record without table data is buffered
//! instead, and the join is produced by whichever comes first:
//!
//! * a table update for the same key ([`TableSideTrigger`]),
//! * a newer stream-side record for the same key, which flushes the old one
//!   with whatever table data is known ([`StreamSideTrigger`]),
//! * the wait time running out on stream time ([`ExpiryScanner`]), in which
//!   case the table side may be missing.
//!
//! ```text
//! Time | Stream              Table         | Join output
//! -----+-----------------------------------+-------------------------
//! 10   | ("alice", 999.99)                 | -
//! 20   |                     ("alice", 1)  | ("alice", (999.99, 1))
//! 30   | ("alice", 555.55)                 | ("alice", (555.55, 1))
//! ```
//!
//! Every stream-side record is joined exactly once. Table-side triggering
//! only fires while a record is waiting and clears the wait when it does, so
//! a second table update never re-joins the same stream-side record.

use std::fmt::Debug;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::config::JoinConfig;
use crate::error::Result;
use crate::store::{KVStore, StoreConfig};
use crate::stream::{Record, Timestamp};
use crate::table::{self, Change};
use crate::task::punctuate::{Punctuator, StreamTime};
use crate::Config;

pub mod expiry;
pub mod stream_side;
pub mod table_side;

pub use expiry::ExpiryScanner;
pub use stream_side::StreamSideTrigger;
pub use table_side::TableSideTrigger;

/// A stream-side value waiting for table data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buffered<V> {
    pub value: V,
    pub arrival: Timestamp,
}

/// Join output. `table` is `None` when no table data was known when the
/// stream-side record had to be sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joined<SV, TV> {
    pub stream: SV,
    pub table: Option<TV>,
}

/// Which path produced a join output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Table data was already present when the stream record arrived.
    Immediate,
    /// Flushed because a newer stream record arrived for the key.
    Superseded,
    /// Table data arrived while the stream record was waiting.
    TableTriggered,
    /// The wait time ran out.
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord<K, SV, TV> {
    pub key: K,
    pub value: Joined<SV, TV>,
    pub timestamp: Timestamp,
    pub origin: Origin,
}

impl<K, SV, TV> JoinedRecord<K, SV, TV> {
    pub(crate) fn new(key: K, stream: SV, table: Option<TV>, timestamp: Timestamp, origin: Origin) -> Self {
        JoinedRecord {
            key,
            value: Joined { stream, table },
            timestamp,
            origin,
        }
    }

    pub fn into_record(self, partition: Option<i32>) -> Record<K, Joined<SV, TV>> {
        Record {
            partition,
            key: self.key,
            value: Some(self.value),
            timestamp: self.timestamp,
        }
    }
}

/// The two stores a join works on. The buffer store is written by all three
/// triggers; the table store is only read by them.
pub struct JoinStores<BS, TS> {
    pub(crate) buffer: BS,
    pub(crate) table: TS,
}

impl<BS, TS> JoinStores<BS, TS> {
    pub fn new(buffer: BS, table: TS) -> Self {
        JoinStores { buffer, table }
    }

    pub fn buffer(&self) -> &BS {
        &self.buffer
    }

    pub fn table(&self) -> &TS {
        &self.table
    }
}

/// Single-threaded join processor owning both stores, the triggers and the
/// stream-time schedule of the expiry scan.
///
/// Stream-side and table-side records must be fed through the same
/// processor; that is what makes the shared buffer store safe without locks.
pub struct StreamTableJoin<K, SV, TV, BS, TS> {
    stores: JoinStores<BS, TS>,
    stream_side: StreamSideTrigger,
    table_side: TableSideTrigger,
    scanner: ExpiryScanner,
    stream_time: StreamTime,
    punctuator: Punctuator,
    _marker: PhantomData<(K, SV, TV)>,
}

impl<K, SV, TV, BS, TS> StreamTableJoin<K, SV, TV, BS, TS>
    where K: Clone + Debug,
          SV: Debug,
          TV: Clone + Debug,
          BS: KVStore<K, Buffered<SV>>,
          TS: KVStore<K, TV>
{
    /// Opens both stores by the names in `cfg`. A store that cannot be opened
    /// is fatal.
    pub fn open(global: &Config, cfg: &JoinConfig) -> Result<Self> {
        cfg.validate()?;
        let buffer = BS::open(StoreConfig::new(global.clone(), &cfg.buffer_store))?;
        let table = TS::open(StoreConfig::new(global.clone(), &cfg.table_store))?;
        Self::with_stores(cfg, buffer, table)
    }

    pub fn with_stores(cfg: &JoinConfig, buffer: BS, table: TS) -> Result<Self> {
        cfg.validate()?;
        info!(
            "Joining with buffer store {} and table store {}, max wait {:?}, checked every {:?}",
            cfg.buffer_store, cfg.table_store, cfg.max_wait_per_record, cfg.expiry_check_interval
        );
        Ok(StreamTableJoin {
            stores: JoinStores::new(buffer, table),
            stream_side: StreamSideTrigger,
            table_side: TableSideTrigger,
            scanner: ExpiryScanner::new(cfg.max_wait_per_record),
            stream_time: StreamTime::default(),
            punctuator: Punctuator::new(cfg.expiry_check_interval),
            _marker: PhantomData,
        })
    }

    /// Handles one stream-side record, appending every output it causes to
    /// `out` in emission order.
    pub fn process_stream(&mut self, key: K, value: SV, ts: Timestamp, out: &mut Vec<JoinedRecord<K, SV, TV>>) {
        let now = self.stream_time.advance(ts);
        if let Some(joined) = self.stream_side.handle(&mut self.stores, key, value, ts, out) {
            out.push(joined);
        }
        self.punctuate(now, out);
    }

    /// Handles one table-side change. The table store is updated before the
    /// table-side trigger looks at the buffer.
    pub fn process_table(&mut self, key: K, change: Change<TV>, ts: Timestamp, out: &mut Vec<JoinedRecord<K, SV, TV>>) {
        let now = self.stream_time.advance(ts);
        table::materialize(&mut self.stores.table, &key, &change);
        if let Some(joined) = self.table_side.handle(&mut self.stores, key, change, ts) {
            out.push(joined);
        }
        self.punctuate(now, out);
    }

    fn punctuate(&mut self, now: Timestamp, out: &mut Vec<JoinedRecord<K, SV, TV>>) {
        if let Some(at) = self.punctuator.poll(now) {
            info!("Punctuating @ timestamp {}", at);
            let expired = self.scanner.scan(&mut self.stores, at, out);
            debug!("Expired {} buffered records, {} still waiting", expired, self.stores.buffer.len());
        }
    }

    pub fn stores(&self) -> &JoinStores<BS, TS> {
        &self.stores
    }

    pub fn stream_time(&self) -> Option<Timestamp> {
        self.stream_time.now()
    }
}
