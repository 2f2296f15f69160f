// src/worker/slots.rs
//! Slot poll orchestrator: once per interval, fire every eligible time slot
//! at most once per calendar day.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use tokio::sync::watch;

use crate::ledger::{DispatchLedger, Slot};
use crate::notify::Notifier;
use crate::source::{ForecastSource, HourForecast};
use crate::summarize::{PromptProfile, Summarizer};
use crate::text::truncate_graceful;
use crate::worker::{ensure_metrics_described, MAX_MESSAGE_CHARS};

pub struct SlotWorker {
    forecast: Arc<dyn ForecastSource>,
    summarizer: Arc<dyn Summarizer>,
    notifier: Arc<dyn Notifier>,
    ledger: DispatchLedger,
    slots: Vec<Slot>,
}

impl SlotWorker {
    pub fn new(
        forecast: Arc<dyn ForecastSource>,
        summarizer: Arc<dyn Summarizer>,
        notifier: Arc<dyn Notifier>,
        slots: Vec<Slot>,
    ) -> Self {
        ensure_metrics_described();
        Self {
            forecast,
            summarizer,
            notifier,
            ledger: DispatchLedger::new(),
            slots,
        }
    }

    pub fn ledger(&self) -> &DispatchLedger {
        &self.ledger
    }

    /// One prune → eligibility → dispatch pass at `now`. Returns the number
    /// of dispatch attempts made. A slot whose fetch fails is left
    /// unmarked so it can retry within the trigger hour; transform or
    /// delivery failures still mark the slot dispatched for the day.
    pub async fn run_cycle_at(&mut self, now: DateTime<Utc>) -> usize {
        counter!("slot_cycles_total").increment(1);
        self.ledger.prune(now.date_naive());

        let mut dispatched = 0usize;
        for slot in &self.slots {
            if !self.ledger.is_eligible(slot, now) {
                continue;
            }
            tracing::info!(slot = %slot.name, "slot eligible");

            let record = match self
                .forecast
                .fetch(slot.target_offset_days, slot.target_hour)
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(slot = %slot.name, error = %e, "forecast fetch failed, slot stays eligible");
                    continue;
                }
            };

            let rendered = render_forecast(&record);
            let body = match self
                .summarizer
                .summarize(&rendered, PromptProfile::Forecast)
                .await
            {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!(slot = %slot.name, error = %e, "summarize failed, sending raw readings");
                    rendered
                }
            };
            let message = truncate_graceful(
                &format!("{} forecast: {body}", slot.name),
                MAX_MESSAGE_CHARS,
            );

            if let Err(e) = self.notifier.deliver(&message).await {
                counter!("deliver_failures_total").increment(1);
                tracing::warn!(
                    slot = %slot.name,
                    notifier = self.notifier.name(),
                    error = %e,
                    "delivery failed, slot still marked dispatched"
                );
            } else {
                tracing::info!(slot = %slot.name, "slot notification delivered");
            }

            self.ledger.mark_dispatched(slot, now);
            counter!("slot_dispatch_total").increment(1);
            dispatched += 1;
        }

        gauge!("cycle_last_run_ts").set(now.timestamp() as f64);
        dispatched
    }

    /// Loop forever (until shutdown): one pass per interval.
    pub async fn run(mut self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = interval.as_secs(),
            slots = self.slots.len(),
            "slot worker started"
        );
        loop {
            if *shutdown.borrow() {
                break;
            }
            let dispatched = self.run_cycle_at(Utc::now()).await;
            if dispatched > 0 {
                tracing::debug!(dispatched, "slot cycle done");
            }
            if !super::idle_or_shutdown(interval, &mut shutdown).await {
                break;
            }
        }
        tracing::info!("slot worker stopped");
    }
}

/// Render a possibly partial record to one line; absent fields read
/// "unknown" rather than failing the slot.
pub fn render_forecast(rec: &HourForecast) -> String {
    let temp = rec
        .temperature_c
        .map(|v| format!("{v:.1}\u{b0}C"))
        .unwrap_or_else(|| "temp unknown".to_string());
    let wind = rec
        .wind_speed_ms
        .map(|v| format!("wind {v:.1} m/s"))
        .unwrap_or_else(|| "wind unknown".to_string());
    let precip = rec
        .precipitation_mm
        .map(|v| format!("precip {v:.1} mm"))
        .unwrap_or_else(|| "precip unknown".to_string());

    match &rec.symbol {
        Some(sym) => format!("{temp}, {wind}, {precip}, {sym}"),
        None => format!("{temp}, {wind}, {precip}"),
    }
}
