use std::time::Duration;

use rdkafka::config::RDKafkaLogLevel;
use rdkafka::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kafka client settings shared by every consumer and producer of a task.
#[derive(Debug, Clone)]
pub struct Config(pub(crate) ClientConfig);

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl Config {
    pub fn new() -> Config {
        Config(ClientConfig::new())
    }

    pub fn set(mut self, key: &str, value: &str) -> Config {
        self.0.set(key, value);
        self
    }

    pub fn set_group(self, group: &str) -> Config {
        self.set("group.id", group)
    }

    pub fn set_log_level(mut self, log_level: RDKafkaLogLevel) -> Config {
        self.0.set_log_level(log_level);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)
    }

    pub fn client(&self) -> &ClientConfig {
        &self.0
    }
}

/// Settings of a table-triggered stream-table join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    /// How long a stream-side record may wait for table data, in stream time.
    pub max_wait_per_record: Duration,
    /// Stream-time interval between scans for expired waits.
    pub expiry_check_interval: Duration,
    /// Name of the store buffering stream-side records.
    pub buffer_store: String,
    /// Name of the store materializing the table side.
    pub table_store: String,
    /// How long records of one input are held back while the other input
    /// has nothing to read. After that the inputs are no longer read in
    /// timestamp order until the silent one produces again.
    pub max_idle: Duration,
}

impl Default for JoinConfig {
    fn default() -> Self {
        JoinConfig {
            max_wait_per_record: Duration::from_secs(5),
            expiry_check_interval: Duration::from_secs(2),
            buffer_store: "stream-buffer-state-store".to_string(),
            table_store: "table-store".to_string(),
            max_idle: Duration::from_secs(1),
        }
    }
}

impl JoinConfig {
    pub fn new() -> JoinConfig {
        JoinConfig::default()
    }

    pub fn max_wait_per_record(mut self, wait: Duration) -> JoinConfig {
        self.max_wait_per_record = wait;
        self
    }

    pub fn expiry_check_interval(mut self, interval: Duration) -> JoinConfig {
        self.expiry_check_interval = interval;
        self
    }

    pub fn buffer_store(mut self, name: &str) -> JoinConfig {
        self.buffer_store = name.to_string();
        self
    }

    pub fn table_store(mut self, name: &str) -> JoinConfig {
        self.table_store = name.to_string();
        self
    }

    pub fn max_idle(mut self, idle: Duration) -> JoinConfig {
        self.max_idle = idle;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_store.is_empty() || self.table_store.is_empty() {
            return Err(Error::Config("store names must not be empty".to_string()));
        }
        if self.buffer_store == self.table_store {
            return Err(Error::Config(format!(
                "buffer and table store share the name '{}'",
                self.buffer_store
            )));
        }
        if self.expiry_check_interval.is_zero() {
            return Err(Error::Config("expiry check interval must be positive".to_string()));
        }
        Ok(())
    }
}
