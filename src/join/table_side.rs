use std::fmt::Debug;

use crate::join::{Buffered, JoinStores, JoinedRecord, Origin};
use crate::store::KVStore;
use crate::stream::Timestamp;
use crate::table::Change;

/// Table-side half of the join.
///
/// Reacts to every observed table update: if a stream-side record is waiting
/// for the key, the fully populated join is produced and the wait cleared.
/// Otherwise the update is only materialized, it never joins by itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableSideTrigger;

impl TableSideTrigger {
    pub fn handle<K, SV, TV, BS, TS>(
        &self,
        stores: &mut JoinStores<BS, TS>,
        key: K,
        change: Change<TV>,
        now: Timestamp,
    ) -> Option<JoinedRecord<K, SV, TV>>
        where K: Debug,
              SV: Debug,
              TV: Debug,
              BS: KVStore<K, Buffered<SV>>,
              TS: KVStore<K, TV>
    {
        info!("Received table record ({:?}, {:?}) with timestamp {}", key, change, now);
        let value = match change {
            Change::Update(value) => value,
            Change::Tombstone => {
                info!("Table value for key {:?} is a tombstone, doing nothing", key);
                return None;
            }
        };
        match stores.buffer.delete(&key) {
            Some(buffered) => {
                info!(
                    "Stream data available for key {:?}, sending fully populated join message ({:?}, {:?})",
                    key, buffered.value, value
                );
                Some(JoinedRecord::new(key, buffered.value, Some(value), now, Origin::TableTriggered))
            }
            None => {
                info!("Stream data not available for key {:?}, doing nothing", key);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::Joined;
    use crate::store::{InMemory, StoreConfig};
    use crate::Config;

    type Stores = JoinStores<InMemory<&'static str, Buffered<u32>>, InMemory<&'static str, i64>>;

    fn stores() -> Stores {
        JoinStores::new(
            InMemory::open(StoreConfig::new(Config::new(), "buffer")).unwrap(),
            InMemory::open(StoreConfig::new(Config::new(), "table")).unwrap(),
        )
    }

    #[test]
    fn completes_waiting_record_once() {
        let mut stores = stores();
        stores.buffer.put("a", Buffered { value: 1, arrival: 10 });

        let joined = TableSideTrigger.handle(&mut stores, "a", Change::Update(5), 20).unwrap();
        assert_eq!(joined.value, Joined { stream: 1, table: Some(5) });
        assert_eq!(joined.origin, Origin::TableTriggered);
        assert_eq!(joined.timestamp, 20);
        assert!(stores.buffer().is_empty());

        // a second update finds nothing waiting
        assert!(TableSideTrigger.handle(&mut stores, "a", Change::Update(6), 30).is_none());
    }

    #[test]
    fn update_without_wait_does_nothing() {
        let mut stores = stores();
        stores.buffer.put("b", Buffered { value: 1, arrival: 10 });

        assert!(TableSideTrigger.handle(&mut stores, "a", Change::Update(5), 20).is_none());
        assert_eq!(stores.buffer().len(), 1);
    }

    #[test]
    fn tombstone_keeps_wait() {
        let mut stores = stores();
        stores.buffer.put("a", Buffered { value: 1, arrival: 10 });

        assert!(TableSideTrigger.handle(&mut stores, "a", Change::Tombstone, 20).is_none());
        assert_eq!(stores.buffer().get(&"a"), Some(&Buffered { value: 1, arrival: 10 }));
    }
}
