//! Test execution outcomes.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Outcome of executing one test input.
#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    Success,
    Failure(FailureCause),
}

impl TestResult {
    /// A failure whose cause is just a message.
    pub fn failure(message: impl Into<String>) -> Self {
        TestResult::Failure(FailureCause::message(message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestResult::Success)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestResult::Success => write!(f, "success"),
            TestResult::Failure(cause) => write!(f, "failure: {cause}"),
        }
    }
}

/// Opaque reason a test failed. The engine never inspects it beyond display.
#[derive(Debug, Clone)]
pub struct FailureCause(Arc<dyn Error + Send + Sync>);

impl FailureCause {
    pub fn new(cause: impl Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(cause))
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self(Arc::new(MessageError(message.into())))
    }

    pub fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl PartialEq for FailureCause {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.to_string() == other.0.to_string()
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct MessageError(String);
