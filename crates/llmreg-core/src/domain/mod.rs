//! Domain models for llmreg.
//!
//! Canonical definitions for the core entities:
//! - `TestCase`: one prompt plus its expected outcome
//! - `Outcome`: terminal per-case result of a run
//! - `RunReport`: immutable snapshot of a whole run
//! - `RegressionError`: fatal configuration errors

pub mod case;
pub mod digest;
pub mod error;
pub mod options;
pub mod outcome;
pub mod report;

pub use case::{BooleanAnswer, CaseRecord, ExpectedOutcome, ExpectedSpec, TestCase};
pub use error::{RegressionError, Result};
pub use options::ProviderOptions;
pub use outcome::{Outcome, Verdict};
pub use report::{ProviderIdentity, RunReport, RunSummary};
