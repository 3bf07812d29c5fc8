//! Name → constructor mapping for provider adapters.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{EchoProvider, OpenAiProvider, ProviderAdapter, ScriptedProvider};
use crate::domain::{RegressionError, Result};

fn empty_settings() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Opaque per-provider configuration.
///
/// The core never reads environment variables or credential files; callers
/// place credentials in `settings` themselves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Registry key, e.g. `openai`.
    pub kind: String,

    /// Backend-specific settings.
    #[serde(default = "empty_settings")]
    pub settings: Value,
}

impl ProviderConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            settings: empty_settings(),
        }
    }

    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = settings;
        self
    }

    /// Set a single settings key, turning `settings` into an object if needed.
    pub fn with_setting(mut self, key: &str, value: Value) -> Self {
        if !self.settings.is_object() {
            self.settings = empty_settings();
        }
        if let Some(map) = self.settings.as_object_mut() {
            map.insert(key.to_string(), value);
        }
        self
    }

    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(Value::as_str)
    }

    pub fn setting_u64(&self, key: &str) -> Option<u64> {
        self.settings.get(key).and_then(Value::as_u64)
    }
}

/// Builds an adapter from its configuration.
pub type ProviderConstructor = fn(&ProviderConfig) -> Result<Arc<dyn ProviderAdapter>>;

fn build_echo(_config: &ProviderConfig) -> Result<Arc<dyn ProviderAdapter>> {
    Ok(Arc::new(EchoProvider::new()))
}

fn build_scripted(config: &ProviderConfig) -> Result<Arc<dyn ProviderAdapter>> {
    Ok(Arc::new(ScriptedProvider::from_config(config)?))
}

fn build_openai(config: &ProviderConfig) -> Result<Arc<dyn ProviderAdapter>> {
    Ok(Arc::new(OpenAiProvider::from_config(config)?))
}

/// Maps provider kinds to constructors.
#[derive(Clone)]
pub struct ProviderRegistry {
    constructors: BTreeMap<String, ProviderConstructor>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ProviderRegistry {
    /// A registry with no providers.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// A registry with `echo`, `scripted` and `openai`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("echo", build_echo);
        registry.register("scripted", build_scripted);
        registry.register("openai", build_openai);
        registry
    }

    /// Register (or replace) a constructor for `kind`.
    pub fn register(&mut self, kind: impl Into<String>, constructor: ProviderConstructor) {
        self.constructors.insert(kind.into(), constructor);
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Construct the adapter described by `config`.
    pub fn build(&self, config: &ProviderConfig) -> Result<Arc<dyn ProviderAdapter>> {
        let constructor = self
            .constructors
            .get(&config.kind)
            .ok_or_else(|| RegressionError::UnknownProvider(config.kind.clone()))?;
        debug!(kind = %config.kind, "building provider adapter");
        constructor(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_kinds() {
        let registry = ProviderRegistry::with_builtins();
        assert_eq!(registry.kinds(), vec!["echo", "openai", "scripted"]);
    }

    #[test]
    fn test_unknown_kind_is_configuration_error() {
        let registry = ProviderRegistry::with_builtins();
        match registry.build(&ProviderConfig::new("carrier-pigeon")) {
            Err(RegressionError::UnknownProvider(kind)) => assert_eq!(kind, "carrier-pigeon"),
            Err(other) => panic!("expected UnknownProvider, got {other:?}"),
            Ok(_) => panic!("expected UnknownProvider"),
        }
    }

    #[test]
    fn test_build_echo_and_scripted() {
        let registry = ProviderRegistry::default();
        let echo = registry.build(&ProviderConfig::new("echo")).unwrap();
        assert_eq!(echo.identity().name, "echo");

        let scripted = registry
            .build(&ProviderConfig::new("scripted").with_settings(json!({"responses": {}})))
            .unwrap();
        assert_eq!(scripted.identity().name, "scripted");
    }

    #[test]
    fn test_custom_registration_replaces_builtin() {
        let mut registry = ProviderRegistry::with_builtins();
        fn fake_echo(_config: &ProviderConfig) -> Result<Arc<dyn ProviderAdapter>> {
            Ok(Arc::new(ScriptedProvider::new().with_model("fake-echo")))
        }
        registry.register("echo", fake_echo);
        let adapter = registry.build(&ProviderConfig::new("echo")).unwrap();
        assert_eq!(adapter.identity().model.as_deref(), Some("fake-echo"));
    }

    #[test]
    fn test_provider_config_settings_default_to_object() {
        let config: ProviderConfig = serde_json::from_value(json!({"kind": "echo"})).unwrap();
        assert!(config.settings.is_object());

        let config = ProviderConfig::new("openai").with_setting("model", json!("gpt-4o-mini"));
        assert_eq!(config.setting_str("model"), Some("gpt-4o-mini"));
    }
}
