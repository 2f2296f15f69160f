// src/source/mod.rs
pub mod forecast;
pub mod statuses;
pub mod types;

pub use forecast::WeatherXmlSource;
pub use statuses::StatusFeedSource;
pub use types::{ContentSource, FetchedItem, ForecastSource, HourForecast};
