// crates/core/src/openai_client.rs

//! OpenAI-compatible chat completions client.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;

use crate::ai_client::{AiClient, ChatRequest, ChatResponse, ChatTurn};
use crate::config::AgentConfig;

/// Blocking client for any chat-completions endpoint.
///
/// Environment variables:
/// - OPENAI_API_KEY: your API key (required)
/// - OPENAI_BASE_URL: e.g. "https://api.openai.com/v1" (default)
/// - OPENAI_MODEL: e.g. "gpt-4o-mini" (default)
pub struct OpenAiClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl OpenAiClient {
    pub fn new(base_url: &str, model: &str, api_key: &str, config: &AgentConfig) -> Result<Self> {
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            api_key: api_key.to_string(),
            model: model.to_string(),
            retry_attempts: config.retry_attempts.max(1),
            retry_backoff: Duration::from_secs(config.retry_backoff_secs),
        })
    }

    pub fn from_env(config: &AgentConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        eprintln!("[OpenAiClient] Using model: {}", model);

        Self::new(&base_url, &model, &api_key, config)
    }
}

/// Char-boundary-safe prefix for debug dumps.
fn preview(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Request body for the chat completions endpoint.
#[derive(Serialize)]
struct CompletionsRequest {
    model: String,
    messages: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

impl AiClient for OpenAiClient {
    fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let body = CompletionsRequest {
            model: self.model.clone(),
            messages: request.messages,
            tools: request.tools,
            tool_choice: request.tool_choice,
        };

        if std::env::var("CALCHAT_DEBUG").is_ok() {
            eprintln!("[OpenAiClient] URL: {}", self.url);
            if let Ok(json) = serde_json::to_string_pretty(&body) {
                eprintln!("[OpenAiClient] Request:\n{}", preview(&json, 2000));
            }
        }

        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            let resp = self
                .client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send();

            match resp {
                Ok(r) => {
                    if !r.status().is_success() {
                        let status = r.status();
                        let text = r.text().unwrap_or_default();

                        if status.as_u16() == 429 || status.is_server_error() {
                            // Linear backoff between retries
                            let delay = self.retry_backoff * attempt;
                            eprintln!(
                                "[OpenAiClient] Attempt {}/{}: HTTP {} - waiting {:?}...",
                                attempt, self.retry_attempts, status, delay
                            );
                            last_error = Some(anyhow::anyhow!("HTTP {} - {}", status, text));
                            std::thread::sleep(delay);
                            continue;
                        }

                        anyhow::bail!("chat request failed: HTTP {} - {}", status, text);
                    }

                    let raw_text = r.text().context("failed to read response body")?;

                    if std::env::var("CALCHAT_DEBUG").is_ok() {
                        eprintln!("[OpenAiClient] Response: {}", preview(&raw_text, 2000));
                    }

                    let parsed: ChatResponse = serde_json::from_str(&raw_text)
                        .context("failed to parse chat completions response")?;

                    return Ok(parsed);
                }
                Err(e) => {
                    eprintln!(
                        "[OpenAiClient] Attempt {}/{} network error: {} - retrying...",
                        attempt, self.retry_attempts, e
                    );
                    last_error = Some(anyhow::anyhow!("network error: {}", e));
                    std::thread::sleep(self.retry_backoff * attempt);
                    continue;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("request failed after retries")))
    }
}
