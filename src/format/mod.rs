use bytes::Bytes;

use crate::error::Result;

pub mod json;

pub use json::JSON;

/// Wire encoding of keys and values on Kafka topics.
pub trait Format {
    type Item;
    fn serialize(v: &Self::Item) -> Result<Bytes>;
    fn deserialize(v: &[u8]) -> Result<Self::Item>;
}
