use std::collections::HashMap;
use std::hash::Hash;

use crate::error::Result;
use crate::Config;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub global: Config,
    pub name: String,
}

impl StoreConfig {
    pub fn new(global: Config, name: &str) -> Self {
        StoreConfig {
            global,
            name: name.to_string(),
        }
    }
}

/// Key-value state owned by a single task.
///
/// Access is never concurrent: the task that owns a store serializes every
/// call, so implementations need no internal locking. Operations are
/// synchronous and infallible once the store is open.
pub trait KVStore<K, V> {
    fn open(cfg: StoreConfig) -> Result<Self> where Self: Sized;
    fn get(&self, key: &K) -> Option<&V>;
    fn put(&mut self, key: K, value: V) -> Option<V>;
    /// Removes the entry, returning it. Deleting an absent key is a no-op.
    fn delete(&mut self, key: &K) -> Option<V>;
    /// Visits every entry in unspecified order.
    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = (&'a K, &'a V)> + 'a>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct InMemory<K: Hash, V> {
    inner: HashMap<K, V>,
}

impl<K: Hash + Eq, V> Default for InMemory<K, V> {
    fn default() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq, V> KVStore<K, V> for InMemory<K, V> {
    fn open(cfg: StoreConfig) -> Result<Self> where Self: Sized {
        trace!("Opening in-memory store {}", cfg.name);
        Ok(Self::default())
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    fn put(&mut self, key: K, value: V) -> Option<V> {
        self.inner.insert(key, value)
    }

    fn delete(&mut self, key: &K) -> Option<V> {
        self.inner.remove(key)
    }

    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = (&'a K, &'a V)> + 'a> {
        Box::new(self.inner.iter())
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
