// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod source;
pub mod summarize;
pub mod text;
pub mod watermark;
pub mod worker;

// ---- Re-exports for stable public API ----
pub use crate::config::Config;
pub use crate::error::{ConfigError, DeliveryError, FetchError, TransformError};
pub use crate::ledger::{DispatchLedger, Slot};
pub use crate::notify::{Notifier, SmsNotifier};
pub use crate::source::{ContentSource, FetchedItem, ForecastSource, HourForecast};
pub use crate::summarize::{PromptProfile, Summarizer};
pub use crate::watermark::{Classified, Watermark};
pub use crate::worker::{CycleReport, SlotWorker, StreamWorker};
