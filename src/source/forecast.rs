// src/source/forecast.rs
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Timelike, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::error::FetchError;
use crate::source::types::{ForecastSource, HourForecast};

#[derive(Debug, Deserialize)]
struct WeatherData {
    forecast: Forecast,
}

#[derive(Debug, Deserialize)]
struct Forecast {
    #[serde(rename = "time", default)]
    times: Vec<TimeEntry>,
}

#[derive(Debug, Deserialize)]
struct TimeEntry {
    #[serde(rename = "@from")]
    from: String,
    temperature: Option<ValueAttr>,
    #[serde(rename = "windSpeed")]
    wind_speed: Option<MpsAttr>,
    precipitation: Option<ValueAttr>,
    symbol: Option<NameAttr>,
}

#[derive(Debug, Deserialize)]
struct ValueAttr {
    #[serde(rename = "@value")]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MpsAttr {
    #[serde(rename = "@mps")]
    mps: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NameAttr {
    #[serde(rename = "@name")]
    name: Option<String>,
}

/// Unparseable numeric attributes degrade to "unknown".
fn parse_num(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
}

#[derive(Debug)]
struct HourEntry {
    from: DateTime<Utc>,
    record: HourForecast,
}

/// Forecast provider reading an hourly weather XML document.
pub struct WeatherXmlSource {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl WeatherXmlSource {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("feed-sentinel/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Unreachable(format!("building http client: {e}")))?;
        Ok(Self {
            mode: Mode::Http { url, client },
        })
    }

    fn parse_entries(xml: &str) -> Result<Vec<HourEntry>, FetchError> {
        let t0 = std::time::Instant::now();
        let data: WeatherData = from_str(xml)
            .context("parsing forecast xml")
            .map_err(|e| FetchError::Malformed(format!("{e:#}")))?;

        let mut out = Vec::with_capacity(data.forecast.times.len());
        for entry in data.forecast.times {
            // Entries with an unreadable timestamp cannot be addressed by
            // (day, hour) and are dropped.
            let Ok(from) = DateTime::parse_from_rfc3339(&entry.from) else {
                tracing::warn!(from = %entry.from, "skipping forecast entry with bad timestamp");
                continue;
            };
            out.push(HourEntry {
                from: from.with_timezone(&Utc),
                record: HourForecast {
                    temperature_c: parse_num(
                        entry.temperature.as_ref().and_then(|v| v.value.as_deref()),
                    ),
                    wind_speed_ms: parse_num(
                        entry.wind_speed.as_ref().and_then(|v| v.mps.as_deref()),
                    ),
                    precipitation_mm: parse_num(
                        entry.precipitation.as_ref().and_then(|v| v.value.as_deref()),
                    ),
                    symbol: entry.symbol.and_then(|s| s.name),
                },
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("fetch_parse_ms").record(ms);
        Ok(out)
    }

    fn select(
        entries: &[HourEntry],
        target_day: NaiveDate,
        hour_of_day: u32,
    ) -> Result<HourForecast, FetchError> {
        entries
            .iter()
            .find(|e| e.from.date_naive() == target_day && e.from.hour() == hour_of_day)
            .map(|e| e.record.clone())
            .ok_or_else(|| {
                FetchError::MissingEntry(format!("{target_day} {hour_of_day:02}:00"))
            })
    }
}

#[async_trait]
impl ForecastSource for WeatherXmlSource {
    async fn fetch(&self, day_offset: i64, hour_of_day: u32) -> Result<HourForecast, FetchError> {
        let xml = match &self.mode {
            Mode::Fixture(s) => s.clone(),
            Mode::Http { url, client } => {
                let resp = client.get(url).send().await.map_err(|e| {
                    counter!("fetch_errors_total").increment(1);
                    FetchError::Unreachable(format!("forecast get: {e}"))
                })?;
                let resp = resp.error_for_status().map_err(|e| {
                    counter!("fetch_errors_total").increment(1);
                    FetchError::Unreachable(format!("forecast http status: {e}"))
                })?;
                resp.text()
                    .await
                    .map_err(|e| FetchError::Malformed(format!("forecast body: {e}")))?
            }
        };

        let entries = Self::parse_entries(&xml)?;
        let target_day = (Utc::now() + ChronoDuration::days(day_offset)).date_naive();
        Self::select(&entries, target_day, hour_of_day)
    }

    fn name(&self) -> &'static str {
        "weather-xml"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<weatherdata>
  <forecast>
    <time from="2025-01-01T12:00:00Z" to="2025-01-01T13:00:00Z">
      <temperature value="3.5"/>
      <windSpeed mps="4.2"/>
      <precipitation value="0.0"/>
      <symbol name="cloudy"/>
    </time>
    <time from="2025-01-02T06:00:00Z" to="2025-01-02T07:00:00Z">
      <temperature value="n/a"/>
      <windSpeed mps="2.0"/>
    </time>
    <time from="not-a-timestamp">
      <temperature value="1.0"/>
    </time>
  </forecast>
</weatherdata>"#;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn full_entry_parses_all_fields() {
        let entries = WeatherXmlSource::parse_entries(FIXTURE).unwrap();
        let rec = WeatherXmlSource::select(&entries, day(2025, 1, 1), 12).unwrap();
        assert_eq!(rec.temperature_c, Some(3.5));
        assert_eq!(rec.wind_speed_ms, Some(4.2));
        assert_eq!(rec.precipitation_mm, Some(0.0));
        assert_eq!(rec.symbol.as_deref(), Some("cloudy"));
    }

    #[test]
    fn partial_entry_degrades_fields_to_unknown() {
        let entries = WeatherXmlSource::parse_entries(FIXTURE).unwrap();
        let rec = WeatherXmlSource::select(&entries, day(2025, 1, 2), 6).unwrap();
        // "n/a" temperature and missing precipitation/symbol are unknown,
        // not errors.
        assert_eq!(rec.temperature_c, None);
        assert_eq!(rec.wind_speed_ms, Some(2.0));
        assert_eq!(rec.precipitation_mm, None);
        assert_eq!(rec.symbol, None);
    }

    #[test]
    fn bad_timestamp_entries_are_dropped() {
        let entries = WeatherXmlSource::parse_entries(FIXTURE).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn missing_hour_is_a_fetch_error() {
        let entries = WeatherXmlSource::parse_entries(FIXTURE).unwrap();
        let err = WeatherXmlSource::select(&entries, day(2025, 1, 1), 18).unwrap_err();
        assert!(matches!(err, FetchError::MissingEntry(_)));
    }

    #[test]
    fn garbage_document_is_malformed() {
        let err = WeatherXmlSource::parse_entries("<<<").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }
}
