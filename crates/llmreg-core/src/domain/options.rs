//! Provider invocation options.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options passed to a provider for a single prompt.
///
/// Every field is optional; adapters ignore what they do not understand or
/// reject it with [`crate::provider::ProviderError::UnsupportedOption`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Backend-specific keys forwarded verbatim.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ProviderOptions {
    /// Overlay `self` on top of `defaults`; fields set on `self` win.
    pub fn merged_over(&self, defaults: &ProviderOptions) -> ProviderOptions {
        let mut extra = defaults.extra.clone();
        for (k, v) in &self.extra {
            extra.insert(k.clone(), v.clone());
        }
        ProviderOptions {
            model: self.model.clone().or_else(|| defaults.model.clone()),
            temperature: self.temperature.or(defaults.temperature),
            max_tokens: self.max_tokens.or(defaults.max_tokens),
            system_prompt: self
                .system_prompt
                .clone()
                .or_else(|| defaults.system_prompt.clone()),
            extra,
        }
    }
}
