use std::fmt::Debug;
use std::time::Duration;

use crate::join::{Buffered, JoinStores, JoinedRecord, Origin};
use crate::store::KVStore;
use crate::stream::Timestamp;
use crate::task::punctuate::millis;

/// Sends buffered stream-side records whose wait for table data has run out.
///
/// Waiting time is measured on stream time, so the check is approximate: it
/// only happens when the scan is punctuated, which needs input to arrive.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryScanner {
    max_wait: Timestamp,
}

impl ExpiryScanner {
    pub fn new(max_wait: Duration) -> Self {
        ExpiryScanner {
            max_wait: millis(max_wait),
        }
    }

    /// A record waiting exactly `max_wait` has not expired yet.
    pub fn is_expired(&self, arrival: Timestamp, now: Timestamp) -> bool {
        now.saturating_sub(arrival) > self.max_wait
    }

    /// Forwards and purges every expired record, returning how many there
    /// were. The table store gets a last lookup; a missing value is sent as
    /// `None`.
    pub fn scan<K, SV, TV, BS, TS>(
        &self,
        stores: &mut JoinStores<BS, TS>,
        now: Timestamp,
        out: &mut Vec<JoinedRecord<K, SV, TV>>,
    ) -> usize
        where K: Clone + Debug,
              SV: Debug,
              TV: Clone + Debug,
              BS: KVStore<K, Buffered<SV>>,
              TS: KVStore<K, TV>
    {
        let expired: Vec<K> = stores
            .buffer
            .iter()
            .filter(|(key, buffered)| {
                trace!("Checking buffered stream record ({:?}, {:?}) with timestamp {}", key, buffered.value, buffered.arrival);
                self.is_expired(buffered.arrival, now)
            })
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired.len();
        for key in expired {
            if let Some(buffered) = stores.buffer.delete(&key) {
                let table = stores.table.get(&key).cloned();
                info!(
                    "Wait time for stream record ({:?}, {:?}) has expired, force-forwarding now as join message ({:?}, ({:?}, {:?}))",
                    key, buffered.value, key, buffered.value, table
                );
                out.push(JoinedRecord::new(key, buffered.value, table, now, Origin::Expired));
            }
        }
        count
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
    fn boundary_age_is_not_expired() {
        let scanner = ExpiryScanner::new(Duration::from_secs(5));
        assert!(!scanner.is_expired(1000, 6000));
        assert!(scanner.is_expired(1000, 6001));
        // records stamped after the scan time are never expired
        assert!(!scanner.is_expired(7000, 6001));
    }

    #[test]
    fn unbounded_wait_never_expires() {
        let scanner = ExpiryScanner::new(Duration::MAX);
        assert!(!scanner.is_expired(0, 2000));
        assert!(!scanner.is_expired(Timestamp::MIN, Timestamp::MAX));
    }

    #[test]
    fn expires_only_old_records() {
        let scanner = ExpiryScanner::new(Duration::from_secs(5));
        let mut stores = stores();
        stores.buffer.put("old", Buffered { value: 1, arrival: 0 });
        stores.buffer.put("edge", Buffered { value: 2, arrival: 1000 });
        stores.buffer.put("young", Buffered { value: 3, arrival: 5000 });
        stores.table.put("old", 9);
        let mut out = Vec::new();

        assert_eq!(scanner.scan(&mut stores, 6000, &mut out), 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "old");
        assert_eq!(out[0].value, Joined { stream: 1, table: Some(9) });
        assert_eq!(out[0].origin, Origin::Expired);
        assert_eq!(stores.buffer().len(), 2);
        assert!(stores.buffer().get(&"old").is_none());
    }

    #[test]
    fn expired_without_table_data_is_sent_with_none() {
        let scanner = ExpiryScanner::new(Duration::from_secs(5));
        let mut stores = stores();
        stores.buffer.put("bob", Buffered { value: 42, arrival: 0 });
        let mut out = Vec::new();

        scanner.scan(&mut stores, 6001, &mut out);
        assert_eq!(out[0].value, Joined { stream: 42, table: None });
        assert!(stores.buffer().is_empty());
    }

    #[test]
    fn scanning_empty_buffer_is_harmless() {
        let scanner = ExpiryScanner::new(Duration::from_secs(5));
        let mut stores = stores();
        let mut out: Vec<JoinedRecord<_, _, i64>> = Vec::new();
        assert_eq!(scanner.scan(&mut stores, 100_000, &mut out), 0);
        assert!(out.is_empty());
    }
}
