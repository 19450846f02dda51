//! Unified error types for the atelier crate.
//!
//! The hierarchy mirrors the failure taxonomy of the system:
//! - provider errors (transport faults, non-2xx responses, malformed replies)
//! - tool errors (unknown tool, invalid arguments)
//! - agent runtime errors (bad input, step ceiling exceeded)

use std::fmt;

/// Result type alias for atelier operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the atelier crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Remote model provider error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Tool dispatch or execution error.
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Agent runtime error.
    #[error("agent error: {0}")]
    Agent(String),

    /// Maximum steps reached during an agent run.
    #[error("maximum steps ({max_steps}) reached without a final answer")]
    MaxSteps {
        /// The configured step ceiling.
        max_steps: usize,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an agent error with a message.
    #[must_use]
    pub fn agent(msg: impl Into<String>) -> Self {
        Self::Agent(msg.into())
    }

    /// Create a max steps error.
    #[must_use]
    pub const fn max_steps(max_steps: usize) -> Self {
        Self::MaxSteps { max_steps }
    }
}

/// Error type for remote model provider operations.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ProviderError {
    /// The error kind.
    pub kind: ProviderErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Optional error code from the provider (HTTP status or API code).
    pub code: Option<String>,
}

/// Categories of provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProviderErrorKind {
    /// Network or connection error.
    Network,
    /// Non-success HTTP status.
    HttpStatus,
    /// The response body did not have the expected shape.
    ResponseFormat,
    /// Provider-reported error.
    Provider,
}

impl ProviderError {
    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Network,
            message: message.into(),
            code: None,
        }
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::HttpStatus,
            message: format!("HTTP {status}: {}", body.into()),
            code: Some(status.to_string()),
        }
    }

    /// Create a response format error.
    #[must_use]
    pub fn response_format(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::ResponseFormat,
            message: message.into(),
            code: None,
        }
    }

    /// Create a provider-reported error.
    #[must_use]
    pub fn provider(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Provider,
            message: message.into(),
            code: None,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("request timed out")
        } else if err.is_connect() {
            Self::network(format!("connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Error type for tool dispatch failures.
///
/// Tool arguments are validated at the loop boundary before dispatch, so a
/// bad request from the model surfaces as a distinct kind here rather than a
/// generic parse fault.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ToolError {
    /// The model requested a tool that is not declared.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The tool arguments did not match the declared schema.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Error during tool execution.
    #[error("execution error: {0}")]
    Execution(String),
}

impl ToolError {
    /// Create an unknown tool error.
    #[must_use]
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    /// Create an invalid arguments error.
    #[must_use]
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn agent_creates_error() {
        let err = Error::agent("something went wrong");
        assert!(matches!(err, Error::Agent(_)));
        assert!(err.to_string().contains("something went wrong"));
    }

    #[test]
    fn max_steps_creates_error() {
        let err = Error::max_steps(8);
        assert!(matches!(err, Error::MaxSteps { max_steps: 8 }));
        assert!(err.to_string().contains('8'));
    }

    #[test]
    fn from_provider_error() {
        let err: Error = ProviderError::network("timeout").into();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[test]
    fn from_tool_error() {
        let err: Error = ToolError::unknown("foo").into();
        assert!(matches!(err, Error::Tool(_)));
    }

    #[test]
    fn http_status_carries_code() {
        let err = ProviderError::http_status(502, "Bad Gateway");
        assert_eq!(err.kind, ProviderErrorKind::HttpStatus);
        assert_eq!(err.code.as_deref(), Some("502"));
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn display_without_code() {
        let err = ProviderError::network("connection refused");
        let s = err.to_string();
        assert!(s.contains("connection refused"));
        assert!(!s.contains("code:"));
    }

    #[test]
    fn tool_error_display() {
        assert_eq!(ToolError::unknown("foo").to_string(), "unknown tool: foo");
        assert!(
            ToolError::invalid_args("missing field `query`")
                .to_string()
                .contains("invalid arguments")
        );
    }
}
