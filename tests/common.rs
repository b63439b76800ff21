#![allow(dead_code)]

use std::cell::RefCell;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;

use futures::StreamExt;
use kstream_join::stream::{Record, Source};
use kstream_join::{Config, KSink, Result};

pub fn cfg() -> Config {
    Config::new()
        .set("bootstrap.servers", "localhost:29092")
        .set("auto.offset.reset", "earliest")
}

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub type Timed<K, V> = Source<Pin<Box<dyn futures::Stream<Item = Record<K, V>>>>>;

/// Releases each record once the (paused) tokio clock reaches its timestamp,
/// counted in milliseconds from now. Lets two sources interleave by timestamp.
pub fn timed<K: 'static, V: 'static>(records: Vec<Record<K, V>>) -> Timed<K, V> {
    let start = tokio::time::Instant::now();
    let stream: Pin<Box<dyn futures::Stream<Item = Record<K, V>>>> =
        Box::pin(futures::stream::iter(records).then(move |record| async move {
            tokio::time::sleep_until(start + Duration::from_millis(record.timestamp as u64)).await;
            record
        }));
    Source::new(stream)
}

/// Collects everything a task writes.
pub struct VecSink<K, V> {
    records: Rc<RefCell<Vec<(K, Option<V>)>>>,
}

impl<K, V> VecSink<K, V> {
    pub fn new() -> (Self, Rc<RefCell<Vec<(K, Option<V>)>>>) {
        let records = Rc::new(RefCell::new(Vec::new()));
        (VecSink { records: records.clone() }, records)
    }
}

#[async_trait::async_trait(?Send)]
impl<K: Clone, V: Clone> KSink for VecSink<K, V> {
    type Key = K;
    type Value = V;

    async fn send_next(&mut self, _part: Option<i32>, k: &K, v: Option<&V>) -> Result<()> {
        self.records.borrow_mut().push((k.clone(), v.cloned()));
        Ok(())
    }
}
