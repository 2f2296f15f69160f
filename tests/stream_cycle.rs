// tests/stream_cycle.rs
mod support;

use std::sync::Arc;

use feed_sentinel::error::FetchError;
use feed_sentinel::source::FetchedItem;
use feed_sentinel::worker::StreamWorker;
use support::{item, EchoSummarizer, FailingSummarizer, RecordingNotifier, ScriptedSource};

fn worker(
    batches: Vec<Result<Vec<FetchedItem>, FetchError>>,
    notifier: Arc<RecordingNotifier>,
) -> StreamWorker {
    StreamWorker::new(
        Arc::new(ScriptedSource::new(batches)),
        Arc::new(EchoSummarizer),
        notifier,
        "feed: ".to_string(),
        10,
    )
}

#[tokio::test]
async fn cold_start_records_baseline_without_notifying() {
    // Unordered fetch on the very first cycle: silent baseline, no backlog
    // flood.
    let notifier = Arc::new(RecordingNotifier::new());
    let mut w = worker(
        vec![Ok(vec![item("5"), item("3"), item("8")])],
        notifier.clone(),
    );

    let report = w.run_cycle().await.unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.new_items, 0);
    assert_eq!(report.delivered, 0);
    assert!(notifier.attempts().is_empty());
    assert_eq!(w.watermark().high(), Some("8"));
}

#[tokio::test]
async fn new_items_notify_in_order_and_watermark_survives_failed_delivery() {
    let notifier = Arc::new(RecordingNotifier::failing_on(vec![0]));
    let mut w = worker(
        vec![
            Ok(vec![item("8")]),
            Ok(vec![item("8"), item("9"), item("10")]),
        ],
        notifier.clone(),
    );

    w.run_cycle().await.unwrap(); // baseline at "8"
    let report = w.run_cycle().await.unwrap();

    assert_eq!(report.new_items, 2);
    assert_eq!(report.delivered, 1); // the delivery for "9" failed

    let attempts = notifier.attempts();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0], "feed: post 9");
    assert_eq!(attempts[1], "feed: post 10");

    // At-most-once: the failed "9" is never reconsidered.
    assert_eq!(w.watermark().high(), Some("10"));
    let report = w.run_cycle().await.unwrap(); // script drained: empty batch
    assert_eq!(report.new_items, 0);
    assert_eq!(notifier.attempts().len(), 2);
}

#[tokio::test]
async fn fetch_failure_aborts_only_that_cycle() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut w = worker(
        vec![
            Ok(vec![item("4")]),
            Err(FetchError::Unreachable("scripted outage".into())),
            Ok(vec![item("5")]),
        ],
        notifier.clone(),
    );

    w.run_cycle().await.unwrap(); // baseline
    assert!(w.run_cycle().await.is_err()); // outage cycle

    let report = w.run_cycle().await.unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(notifier.attempts(), vec!["feed: post 5".to_string()]);
    assert_eq!(w.watermark().high(), Some("5"));
}

#[tokio::test]
async fn transform_failure_falls_back_to_truncated_raw_text() {
    let long_body = "lorem ipsum dolor ".repeat(30); // well over the budget
    let notifier = Arc::new(RecordingNotifier::new());
    let mut w = StreamWorker::new(
        Arc::new(ScriptedSource::new(vec![
            Ok(vec![item("1")]),
            Ok(vec![FetchedItem {
                id: "2".into(),
                raw_content: format!("<p>{long_body}</p>"),
            }]),
        ])),
        Arc::new(FailingSummarizer),
        notifier.clone(),
        "feed: ".to_string(),
        10,
    );

    w.run_cycle().await.unwrap(); // baseline
    let report = w.run_cycle().await.unwrap();
    assert_eq!(report.delivered, 1);

    let attempts = notifier.attempts();
    assert_eq!(attempts.len(), 1);
    let msg = &attempts[0];
    assert!(msg.starts_with("feed: lorem ipsum"));
    assert!(msg.ends_with('…'));
    assert!(msg.chars().count() <= 320);
    // Whitespace-aware cut: no split word before the ellipsis.
    let body = msg.trim_end_matches('…').trim_end();
    assert!(body.ends_with("lorem") || body.ends_with("ipsum") || body.ends_with("dolor"));
}

#[tokio::test]
async fn empty_payload_items_are_skipped_but_still_processed() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut w = worker(
        vec![
            Ok(vec![item("1")]),
            Ok(vec![FetchedItem {
                id: "2".into(),
                raw_content: "<br/>".into(),
            }]),
        ],
        notifier.clone(),
    );

    w.run_cycle().await.unwrap(); // baseline
    let report = w.run_cycle().await.unwrap();

    assert_eq!(report.new_items, 1);
    assert_eq!(report.delivered, 0);
    assert!(notifier.attempts().is_empty());
    // The empty item still advances the watermark.
    assert_eq!(w.watermark().high(), Some("2"));
}

#[tokio::test]
async fn empty_first_batch_does_not_prime_the_baseline() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut w = worker(
        vec![Ok(vec![]), Ok(vec![item("7")])],
        notifier.clone(),
    );

    w.run_cycle().await.unwrap();
    assert!(!w.watermark().is_primed());

    // The first non-empty batch is the baseline, still silent.
    let report = w.run_cycle().await.unwrap();
    assert_eq!(report.delivered, 0);
    assert_eq!(w.watermark().high(), Some("7"));
}
