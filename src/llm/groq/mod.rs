
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{ChatModel, ChatRequest};
use crate::config::LlmConfig;

const EXPONENTIAL_BACKOFF_BASE: u64 = 2;
const TOO_MANY_REQUESTS: u16 = 429;

/// Blocking client for an OpenAI-compatible chat-completion endpoint
/// (Groq by default).
#[derive(Debug, Clone)]
pub struct GroqClient {
    base_url: Url,
    api_key: String,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl GroqClient {
    #[inline]
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let base_url = config
            .api_url()
            .context("Failed to build chat API URL from config")?;

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            agent: build_agent(Duration::from_secs(config.timeout_seconds)),
            retry_attempts: config.retry_attempts.max(1),
        })
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    fn completions_url(&self) -> Result<Url> {
        self.base_url
            .join("chat/completions")
            .context("Failed to build chat completion URL")
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status)
                            if *status >= 500 || *status == TOO_MANY_REQUESTS =>
                        {
                            warn!(
                                "Retryable status {}, attempt {}/{}",
                                status, attempt, self.retry_attempts
                            );
                            true
                        }
                        ureq::Error::StatusCode(status) => {
                            warn!("Client error (status {}), not retrying", status);
                            return Err(anyhow!("Client error: HTTP {}", status));
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => false,
                    };

                    if !should_retry {
                        warn!("Non-retryable error: {}", error);
                        return Err(anyhow!("Non-retryable error: {}", error));
                    }

                    last_error = Some(anyhow!("Request error: {}", error));

                    if attempt < self.retry_attempts {
                        let delay =
                            Duration::from_millis(EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for request to {}", self.base_url);

        Err(last_error.unwrap_or_else(|| anyhow!("Request failed after retries")))
    }
}

impl ChatModel for GroqClient {
    #[inline]
    fn complete(&self, request: &ChatRequest) -> Result<String> {
        let url = self.completions_url()?;
        debug!(
            "Requesting completion from {} with model {} ({} messages)",
            url,
            request.model,
            request.messages.len()
        );

        let request_json =
            serde_json::to_string(request).context("Failed to serialize chat request")?;
        let authorization = format!("Bearer {}", self.api_key);

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .post(url.as_str())
                    .header("Content-Type", "application/json")
                    .header("Authorization", &authorization)
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Chat completion request failed")?;

        let content = parse_completion(&response_text)?;
        info!("Received completion ({} chars)", content.len());
        Ok(content)
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Extract the first choice's message text from a completion body.
fn parse_completion(body: &str) -> Result<String> {
    let response: CompletionResponse =
        serde_json::from_str(body).context("Failed to parse chat completion response")?;

    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Chat completion response contained no choices"))?
        .message
        .content
        .ok_or_else(|| anyhow!("Chat completion response contained no message content"))
}
