//! Chat-completion client with exponential backoff retry logic.
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint over
//! `reqwest`. The retry decorator adds exponential backoff with jitter so a
//! transient upstream failure does not immediately sink a generation run.
//!
//! # Retry strategy
//!
//! - Maximum 3 retry attempts
//! - Exponential backoff starting at 1 second, capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use rand::{rng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::BoxError;

/// One chat request: system framing, user content, optional temperature.
#[derive(Debug, Clone)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
    pub temperature: Option<f32>,
}

/// Trait for async completion backends, so retry logic can wrap any client.
pub trait Complete {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, BoxError>;
}

/// Decorator that adds exponential backoff retry logic to any [`Complete`]
/// implementation.
///
/// The delay between retries follows
/// `min(base_delay * 2^(attempt-1), max_delay) + jitter(0..250ms)`.
pub struct RetryComplete<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryComplete<T>
where
    T: Complete,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryComplete<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryComplete")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Complete for RetryComplete<T>
where
    T: Complete,
{
    #[instrument(level = "info", skip_all)]
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, BoxError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.complete(prompt).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "completion exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "completion attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions API.
///
/// Cheap to clone (`reqwest::Client` is reference-counted internally).
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ChatClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            base_url: config.openai_base_url.clone(),
        }
    }

    /// Send one chat completion with retry, returning the assistant's text.
    ///
    /// Fails immediately (no retry) when the API key is missing; an empty
    /// completion is reported as an error by the caller-facing contract.
    #[instrument(level = "info", skip_all)]
    pub async fn complete_with_backoff(&self, prompt: &ChatPrompt) -> Result<String, BoxError> {
        if self.api_key.is_empty() {
            return Err("Missing OPENAI_API_KEY".into());
        }

        let t0 = Instant::now();
        let api = RetryComplete::new(self.clone(), 3, StdDuration::from_secs(1));
        let res = api.complete(prompt).await;
        let dt = t0.elapsed();

        match &res {
            Ok(_) => info!(elapsed_ms_total = dt.as_millis(), "completion succeeded"),
            Err(e) => {
                error!(elapsed_ms_total = dt.as_millis(), error = %e, "completion failed")
            }
        }
        res
    }

    /// Temperature actually sent: some models only accept their default.
    fn effective_temperature(&self, requested: Option<f32>) -> Option<f32> {
        if self.model.contains("gpt-5") {
            None
        } else {
            requested
        }
    }
}

impl Complete for ChatClient {
    #[instrument(level = "debug", skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, BoxError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.effective_temperature(prompt.temperature),
        };

        debug!(url = %url, "chat completion request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("completion API error ({status}): {body}").into());
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err("Empty completion".into());
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(model: &str) -> ChatClient {
        ChatClient {
            http: reqwest::Client::new(),
            api_key: "k".into(),
            model: model.into(),
            base_url: "http://localhost:0".into(),
        }
    }

    #[test]
    fn test_gpt5_forces_default_temperature() {
        assert_eq!(client("gpt-5").effective_temperature(Some(0.7)), None);
        assert_eq!(client("gpt-5-mini").effective_temperature(Some(0.3)), None);
    }

    #[test]
    fn test_other_models_keep_requested_temperature() {
        assert_eq!(client("gpt-4o").effective_temperature(Some(0.7)), Some(0.7));
        assert_eq!(client("gpt-4o").effective_temperature(None), None);
    }

    #[test]
    fn test_request_serialization_omits_absent_temperature() {
        let request = ChatRequest {
            model: "gpt-5",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("temperature"));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_fatal() {
        let mut c = client("gpt-4o");
        c.api_key.clear();
        let prompt = ChatPrompt {
            system: "s".into(),
            user: "u".into(),
            temperature: None,
        };
        let err = c.complete_with_backoff(&prompt).await.unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
