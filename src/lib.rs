#![deny(unused_must_use)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate async_trait;

pub mod config;
pub mod error;
pub mod format;

pub mod join;
pub mod store;
pub mod stream;
pub mod table;
pub mod task;

pub use config::{Config, JoinConfig};
pub use error::{Error, Result};
pub use join::{Joined, JoinedRecord, StreamTableJoin};
pub use store::KVStore;
pub use stream::{KSink, KStream, Record, StreamItem};
pub use table::Change;
pub use task::Task;
