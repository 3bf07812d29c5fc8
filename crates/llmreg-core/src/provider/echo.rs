use std::time::Instant;

use async_trait::async_trait;

use super::{ProviderAdapter, ProviderResponse, ProviderResult};
use crate::domain::{ProviderIdentity, ProviderOptions};

/// Returns the prompt unchanged. Useful for smoke-testing a suite file.
#[derive(Debug, Clone, Default)]
pub struct EchoProvider;

impl EchoProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProviderAdapter for EchoProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::new("echo", None)
    }

    async fn evaluate(
        &self,
        prompt: &str,
        _options: &ProviderOptions,
    ) -> ProviderResult<ProviderResponse> {
        let start = Instant::now();
        let text = prompt.to_string();
        Ok(ProviderResponse::success(
            text,
            start.elapsed().as_millis() as u64,
        ))
    }
}
