// tests/support/mod.rs
//! Scripted collaborators shared by the cycle tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use feed_sentinel::error::{DeliveryError, FetchError, TransformError};
use feed_sentinel::notify::Notifier;
use feed_sentinel::source::{ContentSource, FetchedItem, ForecastSource, HourForecast};
use feed_sentinel::summarize::{PromptProfile, Summarizer};

pub fn item(id: &str) -> FetchedItem {
    FetchedItem {
        id: id.to_string(),
        raw_content: format!("<p>post {id}</p>"),
    }
}

/// Content source replaying a scripted sequence of batches; drained scripts
/// yield empty batches.
pub struct ScriptedSource {
    batches: Mutex<VecDeque<Result<Vec<FetchedItem>, FetchError>>>,
}

impl ScriptedSource {
    pub fn new(batches: Vec<Result<Vec<FetchedItem>, FetchError>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
        }
    }
}

#[async_trait]
impl ContentSource for ScriptedSource {
    async fn fetch_recent(&self, max_items: usize) -> Result<Vec<FetchedItem>, FetchError> {
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(Ok(mut v)) => {
                v.truncate(max_items);
                Ok(v)
            }
            Some(Err(e)) => Err(e),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Summarizer echoing its input unchanged, so messages stay distinguishable
/// per item in assertions.
pub struct EchoSummarizer;

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(
        &self,
        raw_text: &str,
        _profile: PromptProfile,
    ) -> Result<String, TransformError> {
        Ok(raw_text.to_string())
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

/// Summarizer that always fails, driving the fallback path.
pub struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(
        &self,
        _raw_text: &str,
        _profile: PromptProfile,
    ) -> Result<String, TransformError> {
        Err(TransformError::Request("scripted failure".into()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Notifier logging every attempt; attempt indices listed in `fail_on`
/// (0-based) return a transport error.
pub struct RecordingNotifier {
    log: Mutex<Vec<String>>,
    fail_on: Vec<usize>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::failing_on(Vec::new())
    }

    pub fn failing_on(fail_on: Vec<usize>) -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            fail_on,
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        let idx = {
            let mut log = self.log.lock().unwrap();
            log.push(message.to_string());
            log.len() - 1
        };
        if self.fail_on.contains(&idx) {
            return Err(DeliveryError::Transport("scripted failure".into()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Forecast source returning a fixed record, optionally failing the first
/// N calls.
pub struct FixedForecast {
    record: HourForecast,
    fail_first: Mutex<usize>,
}

impl FixedForecast {
    pub fn new(record: HourForecast) -> Self {
        Self::failing_first(0, record)
    }

    pub fn failing_first(n: usize, record: HourForecast) -> Self {
        Self {
            record,
            fail_first: Mutex::new(n),
        }
    }
}

#[async_trait]
impl ForecastSource for FixedForecast {
    async fn fetch(&self, _day_offset: i64, _hour_of_day: u32) -> Result<HourForecast, FetchError> {
        let mut remaining = self.fail_first.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(FetchError::Unreachable("scripted failure".into()));
        }
        Ok(self.record.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

pub fn full_record() -> HourForecast {
    HourForecast {
        temperature_c: Some(3.5),
        wind_speed_ms: Some(4.2),
        precipitation_mm: Some(0.0),
        symbol: Some("cloudy".into()),
    }
}
