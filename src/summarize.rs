//! Summarizer collaborator: one bounded round trip turning raw text into a
//! short notification sentence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::TransformError;
use crate::text::single_line;

/// Which steering prompt the call uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptProfile {
    /// Condense a stream post into one short sentence, keeping the original
    /// tone and force of the wording.
    Post,
    /// Render an hourly forecast record into one compact human sentence.
    Forecast,
}

impl PromptProfile {
    fn system_prompt(self) -> &'static str {
        match self {
            PromptProfile::Post => {
                "Summarize the following post in ONE sentence of at most 130 \
                 characters. Keep the original tone and force of the wording; \
                 do not soften it. Reply with the summary only."
            }
            PromptProfile::Forecast => {
                "Turn the following forecast readings into ONE short, plain \
                 sentence a person can read on a phone lock screen. Reply \
                 with the sentence only."
            }
        }
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `raw_text`. Output is free text; the caller enforces the
    /// final length cap before delivery.
    async fn summarize(
        &self,
        raw_text: &str,
        profile: PromptProfile,
    ) -> Result<String, TransformError>;
    fn name(&self) -> &'static str;
}

/// Chat-completions summarizer. Requires an API key; carries explicit
/// connect and total timeouts so a stalled call cannot delay the next cycle.
pub struct ChatSummarizer {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatSummarizer {
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, TransformError> {
        let http = reqwest::Client::builder()
            .user_agent("feed-sentinel/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .map_err(|e| TransformError::Request(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            endpoint,
            api_key,
            model,
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: String,
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    async fn summarize(
        &self,
        raw_text: &str,
        profile: PromptProfile,
    ) -> Result<String, TransformError> {
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: profile.system_prompt(),
                },
                Msg {
                    role: "user",
                    content: raw_text,
                },
            ],
            temperature: 0.2,
            max_tokens: 120,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| TransformError::Request(format!("summarizer post: {e}")))?;

        if !resp.status().is_success() {
            return Err(TransformError::Request(format!(
                "summarizer http status {}",
                resp.status()
            )));
        }

        let body: ChatResponse = resp
            .json()
            .await
            .map_err(|e| TransformError::Request(format!("summarizer body: {e}")))?;

        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("");
        let cleaned = single_line(content);
        if cleaned.is_empty() {
            return Err(TransformError::EmptyOutput("blank completion".into()));
        }
        Ok(cleaned)
    }

    fn name(&self) -> &'static str {
        "chat-completions"
    }
}

/// Deterministic summarizer for tests and local runs.
#[derive(Clone)]
pub struct MockSummarizer {
    pub fixed: String,
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(
        &self,
        _raw_text: &str,
        _profile: PromptProfile,
    ) -> Result<String, TransformError> {
        Ok(self.fixed.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_fixed_summary() {
        let s = MockSummarizer {
            fixed: "short summary".into(),
        };
        let out = s.summarize("anything", PromptProfile::Post).await.unwrap();
        assert_eq!(out, "short summary");
    }

    #[test]
    fn profiles_have_distinct_prompts() {
        assert_ne!(
            PromptProfile::Post.system_prompt(),
            PromptProfile::Forecast.system_prompt()
        );
    }
}
