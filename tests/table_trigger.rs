mod common;

use std::time::Duration;

use common::*;

use kstream_join::join::{Buffered, Joined};
use kstream_join::store::InMemory;
use kstream_join::stream::{Record, Source};
use kstream_join::task::Task;
use kstream_join::JoinConfig;

type BufferStore = InMemory<String, Buffered<f64>>;
type TableStore = InMemory<String, i64>;

fn join_cfg() -> JoinConfig {
    JoinConfig::new()
        .max_wait_per_record(Duration::from_secs(5))
        .expiry_check_interval(Duration::from_secs(2))
}

fn key(k: &str) -> String {
    k.to_string()
}

#[tokio::test(start_paused = true)]
async fn table_side_triggers_join() {
    init();
    let stream = timed(vec![
        Record::new(key("alice"), 999.99, 10),
        Record::new(key("alice"), 555.55, 30),
        Record::new(key("recordUsedOnlyToTriggerAdvancementOfStreamTime"), 77777.77, 6000),
    ]);
    let table = timed(vec![Record::new(key("alice"), 1i64, 20)]);
    let (sink, output) = VecSink::new();

    Task::new(cfg(), "table-trigger-join")
        .source(stream)
        .join_table::<_, BufferStore, TableStore>(table, &join_cfg())
        .unwrap()
        .to_sink(sink)
        .await
        .unwrap();

    assert_eq!(
        *output.borrow(),
        vec![
            (key("alice"), Some(Joined { stream: 999.99, table: Some(1) })),
            (key("alice"), Some(Joined { stream: 555.55, table: Some(1) })),
        ]
    );
}

#[tokio::test]
async fn backlogged_topics_join_in_timestamp_order() {
    init();
    // both inputs are fully available up front, like topics produced to
    // before the task starts
    let stream = Source::new(futures::stream::iter(vec![
        Record::new(key("alice"), 999.99, 10),
        Record::new(key("alice"), 555.55, 30),
        Record::new(key("recordUsedOnlyToTriggerAdvancementOfStreamTime"), 77777.77, 6000),
    ]));
    let table = Source::new(futures::stream::iter(vec![Record::new(key("alice"), 1i64, 20)]));
    let (sink, output) = VecSink::new();

    Task::new(cfg(), "table-trigger-backlog")
        .source(stream)
        .join_table::<_, BufferStore, TableStore>(table, &join_cfg())
        .unwrap()
        .to_sink(sink)
        .await
        .unwrap();

    assert_eq!(
        *output.borrow(),
        vec![
            (key("alice"), Some(Joined { stream: 999.99, table: Some(1) })),
            (key("alice"), Some(Joined { stream: 555.55, table: Some(1) })),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn wait_expires_without_table_data() {
    init();
    let stream = timed(vec![
        Record::new(key("bob"), 42.0, 0),
        Record::new(key("unrelated"), 1.0, 6001),
    ]);
    let table = timed(Vec::<Record<String, i64>>::new());
    let (sink, output) = VecSink::new();

    Task::new(cfg(), "expiry")
        .source(stream)
        .join_table::<_, BufferStore, TableStore>(table, &join_cfg())
        .unwrap()
        .to_sink(sink)
        .await
        .unwrap();

    assert_eq!(*output.borrow(), vec![(key("bob"), Some(Joined { stream: 42.0, table: None }))]);
}

#[tokio::test(start_paused = true)]
async fn newer_stream_record_flushes_waiting_one() {
    init();
    let stream = timed(vec![
        Record::new(key("carol"), 1.0, 10),
        Record::new(key("carol"), 2.0, 20),
    ]);
    let table = timed(vec![Record::new(key("carol"), 7i64, 30)]);
    let (sink, output) = VecSink::new();

    Task::new(cfg(), "supersede")
        .source(stream)
        .join_table::<_, BufferStore, TableStore>(table, &join_cfg())
        .unwrap()
        .to_sink(sink)
        .await
        .unwrap();

    assert_eq!(
        *output.borrow(),
        vec![
            (key("carol"), Some(Joined { stream: 1.0, table: None })),
            (key("carol"), Some(Joined { stream: 2.0, table: Some(7) })),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn table_tombstone_and_null_stream_values_emit_nothing() {
    init();
    let stream = timed(vec![
        Record::tombstone(key("dave"), 5),
        Record::new(key("dave"), 3.0, 10),
    ]);
    let table = timed(vec![
        Record::new(key("dave"), 4i64, 1),
        Record::tombstone(key("dave"), 8),
        Record::tombstone(key("dave"), 15),
        Record::new(key("dave"), 5i64, 20),
    ]);
    let (sink, output) = VecSink::new();

    Task::new(cfg(), "tombstones")
        .source(stream)
        .join_table::<_, BufferStore, TableStore>(table, &join_cfg())
        .unwrap()
        .to_sink(sink)
        .await
        .unwrap();

    // the table value was deleted before dave's record, so it waits for the
    // next update instead of joining with the stale one
    assert_eq!(*output.borrow(), vec![(key("dave"), Some(Joined { stream: 3.0, table: Some(5) }))]);
}

#[test]
fn shared_store_names_are_rejected() {
    let stream = timed(Vec::<Record<String, f64>>::new());
    let table = timed(Vec::<Record<String, i64>>::new());
    let join = join_cfg().buffer_store("store").table_store("store");

    let res = Task::new(cfg(), "bad")
        .source(stream)
        .join_table::<_, BufferStore, TableStore>(table, &join);
    assert!(matches!(res, Err(kstream_join::Error::Config(_))));
}
