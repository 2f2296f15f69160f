// src/worker/stream.rs
//! Stream poll orchestrator: fetch → watermark classify → summarize →
//! deliver, one cycle per interval, oldest item first.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, gauge};
use tokio::sync::watch;

use crate::error::FetchError;
use crate::notify::Notifier;
use crate::source::ContentSource;
use crate::summarize::{PromptProfile, Summarizer};
use crate::text::{strip_markup, truncate_graceful};
use crate::watermark::Watermark;
use crate::worker::{ensure_metrics_described, CycleReport, FALLBACK_RAW_CHARS, MAX_MESSAGE_CHARS};

pub struct StreamWorker {
    source: Arc<dyn ContentSource>,
    summarizer: Arc<dyn Summarizer>,
    notifier: Arc<dyn Notifier>,
    watermark: Watermark,
    message_prefix: String,
    max_fetch_items: usize,
}

impl StreamWorker {
    pub fn new(
        source: Arc<dyn ContentSource>,
        summarizer: Arc<dyn Summarizer>,
        notifier: Arc<dyn Notifier>,
        message_prefix: String,
        max_fetch_items: usize,
    ) -> Self {
        ensure_metrics_described();
        Self {
            source,
            summarizer,
            notifier,
            watermark: Watermark::new(),
            message_prefix,
            max_fetch_items,
        }
    }

    pub fn watermark(&self) -> &Watermark {
        &self.watermark
    }

    /// One fetch → classify → notify cycle. A fetch failure aborts the
    /// cycle; transform and delivery failures are absorbed per item and
    /// never stop watermark advancement.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, FetchError> {
        counter!("stream_cycles_total").increment(1);

        let mut items = self.source.fetch_recent(self.max_fetch_items).await?;
        tracing::info!(
            fetched = items.len(),
            source = self.source.name(),
            "fetched stream batch"
        );

        let mut report = CycleReport {
            fetched: items.len(),
            ..Default::default()
        };
        if items.is_empty() {
            return Ok(report);
        }

        // Oldest first; delivery order follows ascending id.
        items.sort_by(|a, b| a.id.cmp(&b.id));

        let primed_before = self.watermark.is_primed();
        let classified = self.watermark.classify(items);

        if !primed_before {
            tracing::info!(
                baseline = self.watermark.high().unwrap_or("-"),
                "first cycle: recorded baseline without notifying"
            );
            gauge!("cycle_last_run_ts").set(Utc::now().timestamp() as f64);
            return Ok(report);
        }

        for c in classified.into_iter().filter(|c| c.is_new) {
            report.new_items += 1;
            counter!("stream_new_items_total").increment(1);

            let text = strip_markup(&c.item.raw_content);
            if text.is_empty() {
                tracing::warn!(id = %c.item.id, "item has no text content, skipping");
                continue;
            }
            tracing::info!(id = %c.item.id, "new item detected");

            let message = match self
                .summarizer
                .summarize(&text, PromptProfile::Post)
                .await
            {
                Ok(summary) => format!("{}{summary}", self.message_prefix),
                Err(e) => {
                    tracing::warn!(id = %c.item.id, error = %e, "summarize failed, sending truncated original");
                    format!(
                        "{}{}",
                        self.message_prefix,
                        truncate_graceful(&text, FALLBACK_RAW_CHARS)
                    )
                }
            };
            let message = truncate_graceful(&message, MAX_MESSAGE_CHARS);

            match self.notifier.deliver(&message).await {
                Ok(()) => {
                    report.delivered += 1;
                    tracing::info!(id = %c.item.id, "notification delivered");
                }
                Err(e) => {
                    counter!("deliver_failures_total").increment(1);
                    tracing::warn!(
                        id = %c.item.id,
                        notifier = self.notifier.name(),
                        error = %e,
                        "delivery failed, item will not be retried"
                    );
                }
            }
        }

        if report.new_items == 0 {
            tracing::info!("no new items");
        }
        gauge!("cycle_last_run_ts").set(Utc::now().timestamp() as f64);
        Ok(report)
    }

    /// Loop forever (until shutdown): one cycle per interval, any cycle
    /// failure logged and absorbed.
    pub async fn run(mut self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(interval_secs = interval.as_secs(), "stream worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            match self.run_cycle().await {
                Ok(report) => {
                    tracing::debug!(?report, "stream cycle done");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stream cycle failed, will retry next interval");
                }
            }
            if !super::idle_or_shutdown(interval, &mut shutdown).await {
                break;
            }
        }
        tracing::info!("stream worker stopped");
    }
}
