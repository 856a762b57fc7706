use std::time::Duration;

use thiserror::Error;

/// Categorizes errors for retry logic and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rate limiting - should retry with backoff
    RateLimit,
    /// Server-side failure (5xx) - should retry
    Server,
    /// Attempt deadline exceeded - should retry
    Timeout,
    /// Network/connection issues - should retry
    Network,
    /// Invalid request (4xx other than 429) - should not retry
    InvalidRequest,
    /// Response body could not be decoded - should not retry
    Decode,
    /// Streaming transport failure - terminal for the stream
    Stream,
    /// Retry budget exhausted - terminal
    Exhausted,
}

/// Invalid client configuration. Fatal at construction, never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base URL is required")]
    MissingBaseUrl,

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("API key is required")]
    MissingApiKey,

    #[error("workspace slug is required")]
    MissingWorkspace,

    #[error("model slug must not be empty")]
    EmptyModel,

    #[error("max_retries must be at least 1")]
    InvalidMaxRetries,

    #[error("retry_initial_delay must be at least 100ms")]
    InvalidRetryDelay,

    #[error("timeout must be at least 1s")]
    InvalidTimeout,
}

/// Errors that can occur while talking to the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP transport failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rate limited by the backend (HTTP 429)
    #[error("rate limited: {message}")]
    RateLimited {
        /// Delay requested by the backend via `Retry-After`, if any
        retry_after: Option<Duration>,
        message: String,
    },

    /// Server-side failure (HTTP 5xx)
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Rejected request (HTTP 4xx other than 429)
    #[error("gateway API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// Attempt exceeded the configured deadline
    #[error("request timed out after {}ms", .limit.as_millis())]
    Timeout { limit: Duration },

    /// Streaming transport failure
    #[error("stream error: {0}")]
    Stream(String),

    /// Success status but a body that does not match the expected shape
    #[error("unexpected response from gateway: {0}")]
    UnexpectedResponse(String),

    /// All attempts failed; wraps the last underlying error
    #[error("all {attempts} attempts failed; last error: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl GatewayError {
    /// Returns the error kind for categorizing errors in retry logic
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(e) => {
                if e.is_decode() {
                    ErrorKind::Decode
                } else {
                    ErrorKind::Network
                }
            }
            Self::Json(_) | Self::UnexpectedResponse(_) => ErrorKind::Decode,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::Server { .. } => ErrorKind::Server,
            Self::Api { .. } => ErrorKind::InvalidRequest,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Stream(_) => ErrorKind::Stream,
            Self::RetriesExhausted { .. } => ErrorKind::Exhausted,
        }
    }

    /// Returns true if another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RateLimit | ErrorKind::Server | ErrorKind::Timeout | ErrorKind::Network
        )
    }

    /// HTTP status associated with this error, when one exists
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Server { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Map a non-success HTTP response to the error taxonomy, consuming the body.
pub async fn error_from_response(response: reqwest::Response) -> GatewayError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    match response.bytes().await {
        Ok(bytes) => parse_error_response(status, retry_after, &bytes),
        Err(e) => GatewayError::Http(e),
    }
}

/// Parse error response from HTTP status and body
pub fn parse_error_response(
    status: reqwest::StatusCode,
    retry_after: Option<Duration>,
    body: &bytes::Bytes,
) -> GatewayError {
    let (message, code) = extract_error_details(body);

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        GatewayError::RateLimited {
            retry_after,
            message,
        }
    } else if status.is_server_error() {
        GatewayError::Server {
            status: status.as_u16(),
            message,
        }
    } else {
        GatewayError::Api {
            status: status.as_u16(),
            message,
            code,
        }
    }
}

/// Extract a message (and optional provider code) from a JSON error body,
/// falling back to the raw body text.
fn extract_error_details(body: &bytes::Bytes) -> (String, Option<String>) {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|c| c.as_str())
            .map(str::to_string);

        // {"error": {"message": "..."}} or a bare {"message": "..."}
        let message = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .or_else(|| value.get("message").and_then(|m| m.as_str()));

        if let Some(message) = message {
            return (message.to_string(), code);
        }
    }

    (String::from_utf8_lossy(body).trim().to_string(), None)
}
