//! Resilient AnythingLLM gateway client
//!
//! This crate turns unreliable HTTP calls to an AnythingLLM-compatible
//! chat-completion gateway into a dependable request/response and streaming
//! API, with support for:
//! - Bounded retries with exponential backoff and jitter
//! - `Retry-After` cooperation on rate limits
//! - Per-attempt timeout enforcement
//! - Streaming chat over `data: {json}` SSE-style frames
//! - HMAC-SHA256 webhook verification with a replay window
//!
//! # Example
//!
//! ```rust,no_run
//! use anyllm::{ChatRequest, GatewayClient, GatewayConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::builder()
//!         .base_url("https://llm.example.com")
//!         .api_key("your-api-key")
//!         .workspace_slug("documents")
//!         .build();
//!     let client = GatewayClient::new(config)?;
//!
//!     let request = ChatRequest::builder()
//!         .system_message("You are a documentation assistant.")
//!         .user_message("Summarize the open document.")
//!         .build();
//!
//!     let response = client.chat(&request).await?;
//!     println!("{}", response.content().unwrap_or("No content"));
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
mod internal;
pub mod request;
pub mod response;
mod retry;

// Re-export main types
pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use request::{ChatMessage, ChatRequest, Role};
pub use response::{
    ChatResponse, ChatStreamEvent, Choice, MessageDelta, ResponseMessage, StreamChoice,
    StreamEventKind, StreamUsage, Usage,
};

// Re-export shared types from anyllm-common
pub use anyllm_common::{
    BoxStream, ConfigError, ErrorKind, GatewayError,
    webhook::{DEFAULT_MAX_AGE, verify_signature},
};
