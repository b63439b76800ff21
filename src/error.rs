use rdkafka::error::KafkaError;

/// Errors surfaced while wiring up or running a join task.
///
/// The join triggers themselves never fail; everything here is either a
/// fatal initialization problem or a failure of the Kafka / serde plumbing
/// around them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid join configuration: {0}")]
    Config(String),

    #[error("state store '{name}' is unavailable: {reason}")]
    StoreUnavailable { name: String, reason: String },

    #[error("kafka client error: {0}")]
    Kafka(#[from] KafkaError),

    #[error("failed to encode or decode record: {0}")]
    Format(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
