// src/source/types.rs
use crate::error::FetchError;

/// External-origin record from the content stream. Read-only; discarded
/// after processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedItem {
    /// Opaque, totally-ordered identifier. The source emits zero-padded
    /// numeric strings, so lexicographic order matches arrival order.
    pub id: String,
    /// Unprocessed payload (markup/text).
    pub raw_content: String,
}

/// One forecast hour. Individual fields may be absent or unparseable in the
/// upstream record; an absent field is "unknown", never a fetch failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourForecast {
    pub temperature_c: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub symbol: Option<String>,
}

#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch up to `max_items` recent items. May return zero items; no
    /// ordering is guaranteed (the caller sorts by id).
    async fn fetch_recent(&self, max_items: usize) -> Result<Vec<FetchedItem>, FetchError>;
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetch the forecast record for the hour `hour_of_day` on the day
    /// `day_offset` days from today.
    async fn fetch(&self, day_offset: i64, hour_of_day: u32) -> Result<HourForecast, FetchError>;
    fn name(&self) -> &'static str;
}
