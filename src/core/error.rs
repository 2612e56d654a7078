//! Error types for the core module.

use super::storage::StorageError;

/// Core error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No Gemini API key could be resolved.
    #[error("API key not configured")]
    ApiKeyMissing,

    /// The request text was empty after trimming.
    #[error("prompt is empty")]
    EmptyPrompt,

    /// The request text exceeded the accepted length.
    #[error("prompt is too long ({len} characters, max {max})")]
    PromptTooLong { len: usize, max: usize },

    /// HTTP transport failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The model API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The model refused the prompt.
    #[error("prompt blocked by the model: {0}")]
    Blocked(String),

    /// The model returned no text.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The model text was not valid JSON.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The model JSON did not match the task schema.
    #[error("response does not match the task schema: {0}")]
    Schema(String),

    /// Plan storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Self::Api { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::EmptyResponse | Self::Parse(_) | Self::Schema(_) => true,
            Self::ApiKeyMissing
            | Self::EmptyPrompt
            | Self::PromptTooLong { .. }
            | Self::Blocked(_)
            | Self::Storage(_)
            | Self::Io(_) => false,
        }
    }

    /// Whether the error was caused by the caller's input rather than the model.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::EmptyPrompt | Self::PromptTooLong { .. })
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_rate_limits_are_retryable() {
        for status in [408, 429, 500, 502, 503] {
            let err = Error::Api {
                status,
                message: String::new(),
            };
            assert!(err.is_retryable(), "{status} should be retryable");
        }
    }

    #[test]
    fn client_errors_are_not_retryable() {
        for status in [400, 401, 403, 404] {
            let err = Error::Api {
                status,
                message: String::new(),
            };
            assert!(!err.is_retryable(), "{status} should not be retryable");
        }
        assert!(!Error::ApiKeyMissing.is_retryable());
        assert!(!Error::Blocked("SAFETY".to_string()).is_retryable());
    }

    #[test]
    fn malformed_model_output_is_retryable() {
        assert!(Error::Schema("bad".to_string()).is_retryable());
        assert!(Error::Parse("bad".to_string()).is_retryable());
        assert!(Error::EmptyResponse.is_retryable());
    }

    #[test]
    fn prompt_errors_are_invalid_input() {
        assert!(Error::EmptyPrompt.is_invalid_input());
        assert!(Error::PromptTooLong { len: 5000, max: 4000 }.is_invalid_input());
        assert!(!Error::EmptyResponse.is_invalid_input());
    }

    #[test]
    fn prompt_too_long_message_includes_limits() {
        let err = Error::PromptTooLong { len: 5000, max: 4000 };
        assert_eq!(
            err.to_string(),
            "prompt is too long (5000 characters, max 4000)"
        );
    }
}
