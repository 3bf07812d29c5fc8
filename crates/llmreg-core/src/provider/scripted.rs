//! Deterministic provider that answers from a prompt → response table.
//!
//! Used to replay recorded model outputs and to drive the executor in tests
//! without touching the network.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;

use super::registry::ProviderConfig;
use super::{ProviderAdapter, ProviderError, ProviderResponse, ProviderResult};
use crate::domain::{ProviderIdentity, ProviderOptions, RegressionError, Result};

#[derive(Debug, Deserialize)]
struct ScriptedSettings {
    #[serde(default)]
    responses: HashMap<String, String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    delay_ms: u64,
}

/// Answers each prompt with a fixed response.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    model: Option<String>,
    responses: HashMap<String, String>,
    delay: Duration,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `prompt` with `response`.
    pub fn respond(mut self, prompt: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses.insert(prompt.into(), response.into());
        self
    }

    /// Model name reported in the run identity.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Simulated latency applied to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Build from `{"responses": {...}, "model": "...", "delay_ms": 0}`.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let settings: ScriptedSettings = serde_json::from_value(config.settings.clone())
            .map_err(|e| RegressionError::InvalidProviderConfig {
                kind: config.kind.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            model: settings.model,
            responses: settings.responses,
            delay: Duration::from_millis(settings.delay_ms),
        })
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::new("scripted", self.model.clone())
    }

    async fn evaluate(
        &self,
        prompt: &str,
        _options: &ProviderOptions,
    ) -> ProviderResult<ProviderResponse> {
        let start = Instant::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let text = self.responses.get(prompt).ok_or_else(|| {
            ProviderError::MalformedRequest(format!("no scripted response for prompt: {prompt}"))
        })?;
        Ok(ProviderResponse::success(
            text.clone(),
            start.elapsed().as_millis() as u64,
        ))
    }
}
