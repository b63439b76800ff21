use std::fmt::Debug;

use crate::store::KVStore;

/// A single update observed on the table side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<V> {
    Update(V),
    /// The key was deleted from the table.
    Tombstone,
}

// Kafka encodes deletes as null payloads
impl<V> From<Option<V>> for Change<V> {
    fn from(v: Option<V>) -> Self {
        match v {
            Some(v) => Change::Update(v),
            None => Change::Tombstone,
        }
    }
}

/// Materializes a table-side change into the store backing the table.
pub fn materialize<K, V, ST>(store: &mut ST, key: &K, change: &Change<V>)
    where K: Clone + Debug,
          V: Clone,
          ST: KVStore<K, V>
{
    match change {
        Change::Update(v) => {
            trace!("Table insert {:?}", key);
            store.put(key.clone(), v.clone());
        }
        Change::Tombstone => {
            trace!("Table delete {:?}", key);
            store.delete(key);
        }
    }
}
