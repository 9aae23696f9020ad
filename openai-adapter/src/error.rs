//! Error types returned by the chat client.

use thiserror::Error;

/// Errors from one chat-completions invocation.
#[derive(Debug, Error)]
pub enum OpenAiError {
    /// The HTTP request itself failed (connect, TLS, timeout).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("api returned status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for display.
        body: String,
    },

    /// The API answered 2xx but the body was not the expected shape.
    #[error("failed to parse api response: {0}")]
    MalformedResponse(String),
}
