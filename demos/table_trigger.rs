use std::time::Duration;

use rdkafka::config::RDKafkaLogLevel;

use kstream_join::format::JSON;
use kstream_join::join::{Buffered, Joined};
use kstream_join::store::InMemory;
use kstream_join::stream::topic::{RawProducer, TypedProducer};
use kstream_join::task::Task;
use kstream_join::{Config, JoinConfig};

// Reads inputTopicForStream and inputTopicForTable from a local broker and
// writes the table-triggered join to outputTopic: ("alice", (999.99, 1)) then
// ("alice", (555.55, 1)). The inputs are read in timestamp order, so this holds
// even though all records are produced before the task starts.
#[tokio::main(flavor = "current_thread")]
async fn main() -> kstream_join::Result<()> {
    std::env::set_var("RUST_LOG", "rdkafka=debug,kstream_join=info");
    env_logger::init();
    let config = Config::new()
        .set("bootstrap.servers", "localhost:29092")
        .set("auto.offset.reset", "earliest")
        .set_log_level(RDKafkaLogLevel::Debug);

    let stream = TypedProducer::<JSON<String>, JSON<f64>>::from(RawProducer::new(&config, "inputTopicForStream")?);
    let table = TypedProducer::<JSON<String>, JSON<i64>>::from(RawProducer::new(&config, "inputTopicForTable")?);
    stream.send_at(&"alice".to_string(), Some(&999.99), 10).await?;
    table.send_at(&"alice".to_string(), Some(&1), 20).await?;
    stream.send_at(&"alice".to_string(), Some(&555.55), 30).await?;
    stream
        .send_at(&"recordUsedOnlyToTriggerAdvancementOfStreamTime".to_string(), Some(&77777.77), 6_000)
        .await?;

    let join = JoinConfig::new()
        .max_wait_per_record(Duration::from_secs(5))
        .expiry_check_interval(Duration::from_secs(2))
        .max_idle(Duration::from_secs(10));

    Task::new(config, "table-trigger-join")
        .stream::<JSON<String>, JSON<f64>>("inputTopicForStream")?
        .join_table_topic::<JSON<String>, JSON<i64>, InMemory<String, Buffered<f64>>, InMemory<String, i64>>("inputTopicForTable", &join)?
        .to::<JSON<String>, JSON<Joined<f64, i64>>>("outputTopic")
        .await
}
