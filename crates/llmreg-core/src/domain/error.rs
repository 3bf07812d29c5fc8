//! Configuration-level error taxonomy for llmreg.
//!
//! Everything in here is fatal: it aborts before any provider call is made.
//! Per-case provider failures live in [`crate::provider::ProviderError`] and
//! are always recovered into an [`crate::domain::Outcome`].

/// Fatal llmreg errors.
#[derive(Debug, thiserror::Error)]
pub enum RegressionError {
    #[error("duplicate test case identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("malformed test case at index {index}: {reason}")]
    MalformedCase { index: usize, reason: String },

    #[error("invalid run policy: {0}")]
    InvalidPolicy(String),

    #[error("unknown provider kind: {0}")]
    UnknownProvider(String),

    #[error("invalid provider config for {kind}: {reason}")]
    InvalidProviderConfig { kind: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegressionError {
    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedCase {
            index,
            reason: reason.into(),
        }
    }
}

/// Result type for llmreg configuration-level operations.
pub type Result<T> = std::result::Result<T, RegressionError>;
