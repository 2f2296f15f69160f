// src/worker/mod.rs
pub mod slots;
pub mod stream;

pub use slots::SlotWorker;
pub use stream::StreamWorker;

use std::time::Duration;

use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use tokio::sync::watch;

/// Hard cap for any outgoing message.
pub const MAX_MESSAGE_CHARS: usize = 320;
/// Raw-text budget for the transform-failure fallback message.
pub const FALLBACK_RAW_CHARS: usize = 280;

/// One-time metrics registration.
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("stream_cycles_total", "Stream poll cycles run.");
        describe_counter!("stream_new_items_total", "Items classified as new.");
        describe_counter!("slot_cycles_total", "Slot poll cycles run.");
        describe_counter!("slot_dispatch_total", "Slot dispatch attempts made.");
        describe_counter!("deliver_failures_total", "Failed delivery attempts.");
        describe_counter!("fetch_errors_total", "Provider fetch errors.");
        describe_gauge!("cycle_last_run_ts", "Unix ts of the last completed cycle.");
    });
}

/// Outcome of one stream cycle, for logs and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub new_items: usize,
    pub delivered: usize,
}

/// Block for one poll interval, waking early on shutdown. Returns `false`
/// once shutdown is signaled, `true` when the interval elapsed.
pub(crate) async fn idle_or_shutdown(
    interval: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    let deadline = tokio::time::Instant::now() + interval;
    loop {
        if *shutdown.borrow() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return true,
            res = shutdown.changed() => {
                if res.is_err() {
                    // Sender gone; no signal can arrive, sleep out the rest.
                    tokio::time::sleep_until(deadline).await;
                    return true;
                }
            }
        }
    }
}
