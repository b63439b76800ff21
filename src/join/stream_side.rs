use std::fmt::Debug;

use crate::join::{Buffered, JoinStores, JoinedRecord, Origin};
use crate::store::KVStore;
use crate::stream::Timestamp;

/// Stream-side half of the join.
///
/// Waits for table data when there is none yet, trading latency for fully
/// populated join output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamSideTrigger;

impl StreamSideTrigger {
    /// Any record already waiting for `key` is forwarded into `out` first. The
    /// join for the new record is returned if table data is known, otherwise
    /// the record is buffered and `None` is returned.
    pub fn handle<K, SV, TV, BS, TS>(
        &self,
        stores: &mut JoinStores<BS, TS>,
        key: K,
        value: SV,
        now: Timestamp,
        out: &mut Vec<JoinedRecord<K, SV, TV>>,
    ) -> Option<JoinedRecord<K, SV, TV>>
        where K: Clone + Debug,
              SV: Debug,
              TV: Clone + Debug,
              BS: KVStore<K, Buffered<SV>>,
              TS: KVStore<K, TV>
    {
        info!("Received stream record ({:?}, {:?}) with timestamp {}", key, value, now);
        self.flush_buffered(stores, &key, now, out);
        self.join_or_buffer(stores, key, value, now)
    }

    // At most one record may wait per key, so a new arrival ends the old wait
    fn flush_buffered<K, SV, TV, BS, TS>(
        &self,
        stores: &mut JoinStores<BS, TS>,
        key: &K,
        now: Timestamp,
        out: &mut Vec<JoinedRecord<K, SV, TV>>,
    )
        where K: Clone + Debug,
              SV: Debug,
              TV: Clone + Debug,
              BS: KVStore<K, Buffered<SV>>,
              TS: KVStore<K, TV>
    {
        if let Some(buffered) = stores.buffer.delete(key) {
            let table = stores.table.get(key).cloned();
            info!(
                "Force-forwarding buffered stream record ({:?}, {:?}) with table value {:?} because new stream record received for same key",
                key, buffered.value, table
            );
            out.push(JoinedRecord::new(key.clone(), buffered.value, table, now, Origin::Superseded));
        }
    }

    fn join_or_buffer<K, SV, TV, BS, TS>(
        &self,
        stores: &mut JoinStores<BS, TS>,
        key: K,
        value: SV,
        now: Timestamp,
    ) -> Option<JoinedRecord<K, SV, TV>>
        where K: Clone + Debug,
              SV: Debug,
              TV: Clone + Debug,
              BS: KVStore<K, Buffered<SV>>,
              TS: KVStore<K, TV>
    {
        match stores.table.get(&key).cloned() {
            Some(table) => {
                info!("Table data available for key {:?}, sending fully populated join message", key);
                Some(JoinedRecord::new(key, value, Some(table), now, Origin::Immediate))
            }
            None => {
                info!("Table data not available for key {:?}, buffering stream record {:?} temporarily", key, value);
                stores.buffer.put(key, Buffered { value, arrival: now });
                None
            }
        }
    }
}
