//! Provider adapters: the only place llmreg performs network I/O.
//!
//! Every backend implements [`ProviderAdapter`]. Adapters are selected at
//! configuration time through the [`ProviderRegistry`] (kind name →
//! constructor), so there is no global default provider.
//!
//! # Modules
//!
//! - [`echo`]: `EchoProvider`, returns the prompt verbatim
//! - [`scripted`]: `ScriptedProvider`, canned responses keyed by prompt
//! - [`openai`]: `OpenAiProvider`, OpenAI-compatible chat completions
//! - [`registry`]: `ProviderRegistry`, `ProviderConfig`

pub mod echo;
pub mod openai;
pub mod registry;
pub mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ProviderIdentity, ProviderOptions};

pub use echo::EchoProvider;
pub use openai::OpenAiProvider;
pub use registry::{ProviderConfig, ProviderConstructor, ProviderRegistry};
pub use scripted::ScriptedProvider;

/// Failure of a single provider invocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("provider timed out after {limit_ms}ms")]
    Timeout { limit_ms: u64 },

    #[error("connectivity error: {0}")]
    Connectivity(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("provider server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("malformed provider payload: {0}")]
    MalformedPayload(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("unsupported option: {0}")]
    UnsupportedOption(String),
}

impl ProviderError {
    /// Transient failures are retried; permanent ones are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Connectivity(_)
                | Self::RateLimited(_)
                | Self::Server { .. }
                | Self::MalformedPayload(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Connectivity(_) => "connectivity",
            Self::RateLimited(_) => "rate_limited",
            Self::Server { .. } => "server",
            Self::MalformedPayload(_) => "malformed_payload",
            Self::MalformedRequest(_) => "malformed_request",
            Self::UnsupportedOption(_) => "unsupported_option",
        }
    }
}

/// Result type for provider invocations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// How a single invocation ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    TimedOut,
    Errored,
}

/// What one provider invocation produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderResponse {
    pub text: String,
    pub latency_ms: u64,
    pub status: ResponseStatus,
}

impl ProviderResponse {
    pub fn success(text: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            text: text.into(),
            latency_ms,
            status: ResponseStatus::Success,
        }
    }

    /// Record of a failed attempt; carries no text.
    pub fn failed(error: &ProviderError, latency_ms: u64) -> Self {
        let status = match error {
            ProviderError::Timeout { .. } => ResponseStatus::TimedOut,
            _ => ResponseStatus::Errored,
        };
        Self {
            text: String::new(),
            latency_ms,
            status,
        }
    }
}

/// A pluggable LLM backend.
///
/// Implementations must not carry state between calls: invoking `evaluate`
/// twice with the same prompt is indistinguishable, from the caller's side,
/// from invoking it once.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Name and model reported in run reports.
    fn identity(&self) -> ProviderIdentity;

    /// Send `prompt` to the backend and return its raw answer.
    async fn evaluate(
        &self,
        prompt: &str,
        options: &ProviderOptions,
    ) -> ProviderResult<ProviderResponse>;
}
