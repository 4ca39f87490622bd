//! Custom error types for the harness
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for harness operations
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The agent failed while planning or executing an instruction
    #[error("Agent error: {0}")]
    Agent(String),

    /// An `aiAssert` check did not hold
    #[error("Assertion failed: {assertion}{}", .message.as_ref().map(|m| format!(" ({m})")).unwrap_or_default())]
    AssertionFailed {
        assertion: String,
        message: Option<String>,
    },

    /// An `aiWaitFor` condition did not hold within its bound
    #[error("Wait for '{assertion}' timed out after {timeout_ms}ms")]
    WaitForTimeout { assertion: String, timeout_ms: u64 },

    /// Page automation errors
    #[error("Page error: {0}")]
    Page(String),

    /// A page wait exceeded its bound
    #[error("Timeout exceeded after {0}ms")]
    Timeout(u64),

    /// Model output that does not match the action grammar
    #[error("Cannot parse action '{text}': {reason}")]
    ActionParse { text: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    /// Create an agent error
    pub fn agent(msg: impl Into<String>) -> Self {
        Self::Agent(msg.into())
    }

    /// Create a page error
    pub fn page(msg: impl Into<String>) -> Self {
        Self::Page(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an assertion failure
    pub fn assertion_failed(assertion: impl Into<String>, message: Option<&str>) -> Self {
        Self::AssertionFailed {
            assertion: assertion.into(),
            message: message.map(str::to_string),
        }
    }

    /// Create an action parse error
    pub fn action_parse(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ActionParse {
            text: text.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a timeout of some kind
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::WaitForTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_message() {
        let err = HarnessError::assertion_failed("button is visible", None);
        assert_eq!(err.to_string(), "Assertion failed: button is visible");

        let err = HarnessError::assertion_failed("button is visible", Some("no button"));
        assert_eq!(
            err.to_string(),
            "Assertion failed: button is visible (no button)"
        );
    }

    #[test]
    fn test_is_timeout() {
        assert!(HarnessError::Timeout(20000).is_timeout());
        assert!(!HarnessError::agent("boom").is_timeout());
    }
}
