// src/source/statuses.rs
use anyhow::Context;
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::Duration;

use crate::error::FetchError;
use crate::source::types::{ContentSource, FetchedItem};

/// One entry of the account's status feed, as served by the upstream API.
#[derive(Debug, Deserialize)]
struct Status {
    id: String,
    #[serde(default)]
    content: String,
}

/// Content stream provider reading an account's status feed as JSON.
pub struct StatusFeedSource {
    mode: Mode,
}

enum Mode {
    // Owned copy so tests can hand in decoded payloads without 'static.
    Fixture(String),
    Http {
        feed_url: String,
        client: reqwest::Client,
    },
}

impl StatusFeedSource {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(feed_url: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("feed-sentinel/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Unreachable(format!("building http client: {e}")))?;
        Ok(Self {
            mode: Mode::Http { feed_url, client },
        })
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<FetchedItem>, FetchError> {
        let t0 = std::time::Instant::now();
        let statuses: Vec<Status> = serde_json::from_str(s)
            .context("parsing status feed json")
            .map_err(|e| FetchError::Malformed(format!("{e:#}")))?;

        let out: Vec<FetchedItem> = statuses
            .into_iter()
            .map(|st| FetchedItem {
                id: st.id,
                raw_content: st.content,
            })
            .collect();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("fetch_parse_ms").record(ms);
        counter!("fetch_items_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl ContentSource for StatusFeedSource {
    async fn fetch_recent(&self, max_items: usize) -> Result<Vec<FetchedItem>, FetchError> {
        match &self.mode {
            Mode::Fixture(s) => {
                let mut items = Self::parse_items_from_str(s)?;
                items.truncate(max_items);
                Ok(items)
            }
            Mode::Http { feed_url, client } => {
                let resp = client
                    .get(feed_url)
                    .query(&[("limit", max_items)])
                    .send()
                    .await
                    .map_err(|e| {
                        counter!("fetch_errors_total").increment(1);
                        FetchError::Unreachable(format!("status feed get: {e}"))
                    })?;
                let resp = resp.error_for_status().map_err(|e| {
                    counter!("fetch_errors_total").increment(1);
                    FetchError::Unreachable(format!("status feed http status: {e}"))
                })?;
                let body = resp
                    .text()
                    .await
                    .map_err(|e| FetchError::Malformed(format!("status feed body: {e}")))?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "status-feed"
    }
}
