#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(clippy::pedantic, clippy::unwrap_used)]

//! Shared HTTP client abstractions for the anyllm gateway client
//!
//! This crate provides the pieces of the gateway client that are independent
//! of the chat API surface: the error taxonomy, request construction, backoff
//! computation, SSE stream decoding, and webhook signature verification.

pub mod backoff;
pub mod error;
pub mod request_builder;
pub mod streaming;
pub mod webhook;

pub use backoff::{BACKOFF_CAP, compute_delay};
pub use error::{ConfigError, ErrorKind, GatewayError};
pub use request_builder::{AuthMethod, Endpoint, HttpMethod, RequestBuilder, RequestConfig};
pub use streaming::SseParser;
pub use webhook::{DEFAULT_MAX_AGE, verify_signature};

/// Re-export common types for convenience
pub use futures_util::stream::BoxStream;
