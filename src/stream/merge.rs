use std::time::Duration;

use crate::stream::{KStream, Record, StreamItem};

/// An item of a [`Merge`], tagged with the side it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Merged<K, L, R> {
    Rebalance(Vec<i32>),
    Left(Record<K, L>),
    Right(Record<K, R>),
}

struct Input<S: KStream> {
    stream: S,
    head: Option<Record<S::Key, S::Value>>,
    done: bool,
    /// Set once the side kept the other one waiting for the full idle time.
    /// Cleared by its next record.
    idle: bool,
}

impl<S: KStream> Input<S> {
    fn new(stream: S) -> Self {
        Input {
            stream,
            head: None,
            done: false,
            idle: false,
        }
    }

    fn waiting(&self) -> bool {
        self.head.is_none() && !self.done
    }

    // Returns the partitions of a rebalance, which is passed on right away.
    fn accept(&mut self, item: Option<StreamItem<S::Key, S::Value>>) -> Option<Vec<i32>> {
        match item {
            None => {
                self.done = true;
                None
            }
            Some(StreamItem::Item(record)) => {
                self.head = Some(record);
                self.idle = false;
                None
            }
            Some(StreamItem::Rebalance(parts)) => Some(parts),
        }
    }
}

/// Timestamp-ordered union of two input streams with the same key type.
///
/// Each side keeps one head record. When both sides have one, the older goes
/// first; the left side wins ties. A side with no record ready holds the
/// other one back for up to `max_idle`. Once that runs out, the other side is
/// processed without waiting until the idle side produces again. The merge
/// ends once both sides have ended.
pub struct Merge<L, R>
    where L: KStream,
          R: KStream<Key = L::Key>
{
    left: Input<L>,
    right: Input<R>,
    max_idle: Duration,
}

impl<L, R> Merge<L, R>
    where L: KStream,
          R: KStream<Key = L::Key>
{
    pub fn new(left: L, right: R, max_idle: Duration) -> Self {
        Merge {
            left: Input::new(left),
            right: Input::new(right),
            max_idle,
        }
    }

    pub async fn next(&mut self) -> Option<Merged<L::Key, L::Value, R::Value>> {
        loop {
            if self.left.waiting() && self.right.waiting() {
                let pulled = tokio::select! {
                    biased;
                    item = self.left.stream.next() => Side::Left(item),
                    item = self.right.stream.next() => Side::Right(item),
                };
                let parts = match pulled {
                    Side::Left(item) => self.left.accept(item),
                    Side::Right(item) => self.right.accept(item),
                };
                if let Some(parts) = parts {
                    return Some(Merged::Rebalance(parts));
                }
                continue;
            }

            if self.left.waiting() {
                if let Some(parts) = wait_for(&mut self.left, self.right.head.is_some(), self.max_idle, "Left").await {
                    return Some(Merged::Rebalance(parts));
                }
            } else if self.right.waiting() {
                if let Some(parts) = wait_for(&mut self.right, self.left.head.is_some(), self.max_idle, "Right").await {
                    return Some(Merged::Rebalance(parts));
                }
            }

            // Each side now has a head, has ended, or is idle behind the other's head.
            let left_first = match (&self.left.head, &self.right.head) {
                (Some(l), Some(r)) => l.timestamp <= r.timestamp,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => return None,
            };
            return if left_first {
                self.left.head.take().map(Merged::Left)
            } else {
                self.right.head.take().map(Merged::Right)
            };
        }
    }
}

enum Side<L, R> {
    Left(L),
    Right(R),
}

// Pulls the next item of a side that has no head record. While the other side
// holds a record, the wait is bounded by `max_idle`, or not done at all once
// the side is known to be idle.
async fn wait_for<S: KStream>(input: &mut Input<S>, other_ready: bool, max_idle: Duration, name: &str) -> Option<Vec<i32>> {
    if !other_ready {
        let item = input.stream.next().await;
        return input.accept(item);
    }
    let wait = if input.idle { Duration::ZERO } else { max_idle };
    match tokio::time::timeout(wait, input.stream.next()).await {
        Ok(item) => input.accept(item),
        Err(_) => {
            if !input.idle {
                debug!("{} side of merge idle for {:?}, going on without it", name, max_idle);
            }
            input.idle = true;
            None
        }
    }
}
