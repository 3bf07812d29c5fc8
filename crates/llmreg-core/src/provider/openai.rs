//! OpenAI-compatible chat-completions adapter.
//!
//! Works against any server exposing `POST {base_url}/chat/completions`
//! with the OpenAI request/response shape.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use super::registry::ProviderConfig;
use super::{ProviderAdapter, ProviderError, ProviderResponse, ProviderResult};
use crate::domain::{ProviderIdentity, ProviderOptions, RegressionError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;
const MAX_TEMPERATURE: f32 = 2.0;

/// Chat-completions client for a single model.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    request_timeout_ms: u64,
}

impl OpenAiProvider {
    /// Build from settings: `model` (required), `api_key`, `base_url`,
    /// `request_timeout_ms`.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let invalid = |reason: String| RegressionError::InvalidProviderConfig {
            kind: config.kind.clone(),
            reason,
        };

        let model = config
            .setting_str("model")
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| invalid("missing 'model' setting".to_string()))?
            .to_string();
        let base_url = config
            .setting_str("base_url")
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let api_key = config.setting_str("api_key").map(str::to_string);
        let request_timeout_ms = config
            .setting_u64("request_timeout_ms")
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(request_timeout_ms))
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model,
            request_timeout_ms,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Request body for `prompt` under `options`.
    pub fn build_body(&self, prompt: &str, options: &ProviderOptions) -> ProviderResult<Value> {
        let mut messages = Vec::new();
        if let Some(system) = &options.system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let model = options.model.as_deref().unwrap_or(&self.model);
        let mut body = json!({
            "model": model,
            "messages": messages,
        });

        if let Some(temperature) = options.temperature {
            if !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
                return Err(ProviderError::UnsupportedOption(format!(
                    "temperature {temperature} outside 0.0..={MAX_TEMPERATURE}"
                )));
            }
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        for (key, value) in &options.extra {
            if key == "messages" || key == "model" {
                return Err(ProviderError::UnsupportedOption(format!(
                    "'{key}' cannot be overridden through extra options"
                )));
            }
            body[key.as_str()] = value.clone();
        }
        Ok(body)
    }

    fn classify_transport(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                limit_ms: self.request_timeout_ms,
            }
        } else if err.is_decode() {
            ProviderError::MalformedPayload(err.to_string())
        } else if err.is_builder() {
            ProviderError::MalformedRequest(err.to_string())
        } else {
            ProviderError::Connectivity(err.to_string())
        }
    }
}

/// Map a non-success HTTP status to a provider error. `limit_ms` is the
/// request timeout reported for 408/504.
pub(crate) fn classify_status(status: StatusCode, body: &str, limit_ms: u64) -> ProviderError {
    let message = body.chars().take(512).collect::<String>();
    if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited(message)
    } else if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        ProviderError::Timeout { limit_ms }
    } else if status.is_server_error() {
        ProviderError::Server {
            status: status.as_u16(),
            message,
        }
    } else {
        ProviderError::MalformedRequest(format!("status {}: {}", status.as_u16(), message))
    }
}

/// Extract `choices[0].message.content` from a completion body.
pub(crate) fn parse_completion(body: &Value) -> ProviderResult<String> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ProviderError::MalformedPayload("missing choices[0].message.content".to_string())
        })
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::new("openai", Some(self.model.clone()))
    }

    async fn evaluate(
        &self,
        prompt: &str,
        options: &ProviderOptions,
    ) -> ProviderResult<ProviderResponse> {
        let body = self.build_body(prompt, options)?;
        let start = Instant::now();

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.classify_transport(e))?;
        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(status = status.as_u16(), latency_ms, "chat completion returned");

        if !status.is_success() {
            return Err(classify_status(status, &text, self.request_timeout_ms));
        }

        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::MalformedPayload(e.to_string()))?;
        let content = parse_completion(&payload)?;
        Ok(ProviderResponse::success(content, latency_ms))
    }
}
