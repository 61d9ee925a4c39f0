//! Error types for provisioning operations.
//!
//! Two kinds, and only two: [`Error::InvalidInput`] is detected entirely
//! locally before any remote call, so re-invoking with corrected input is
//! always safe. [`Error::Step`] means the provider rejected a step; resources
//! created by earlier steps are still there.

use crate::client::RemoteError;
use crate::plan::Step;
use serde::Serialize;
use std::fmt;

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Failure of one provisioning step against the remote provider.
///
/// Fatal to the execution. Names the step so the operator knows how far the
/// run got; the handles created before (and during) the step are in the
/// accompanying report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("step {step} failed: {error}")]
pub struct StepFailure {
    pub step: Step,
    pub error: RemoteError,
}

/// Errors that can come out of planning or execution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input rejected before any remote call. Every failing field is listed.
    #[error("invalid input: {}", join_issues(.issues))]
    InvalidInput { issues: Vec<FieldIssue> },

    /// A provisioning step failed remotely.
    #[error(transparent)]
    Step(#[from] StepFailure),
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
