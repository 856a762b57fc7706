use std::fmt;

use anyllm_common::{BoxStream, ConfigError, GatewayError, SseParser, error};
use async_stream::try_stream;
use futures_util::stream;

use crate::{
    ChatRequest, ChatResponse, ChatStreamEvent, GatewayConfig,
    internal::GatewayRequestHelper,
    retry::{Disposition, classify},
};

/// Resilient gateway client.
///
/// Construction validates the configuration; the client holds no mutable
/// state afterwards, so one instance may serve concurrent calls without
/// locking.
pub struct GatewayClient {
    config: GatewayConfig,
    helper: GatewayRequestHelper,
}

impl GatewayClient {
    /// Create a client from a validated configuration
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let helper = GatewayRequestHelper::new(reqwest::Client::new(), &config);
        Ok(Self { config, helper })
    }

    /// Create a client from `ANYTHINGLLM_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(GatewayConfig::from_env()?)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Send a chat request, retrying transient failures.
    ///
    /// Runs at most `max_retries` attempts (attempt 0 is the first try),
    /// strictly sequentially. Rate limits honor `Retry-After`; other
    /// transient failures back off exponentially with jitter. Each attempt is
    /// bounded by the configured timeout.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        let payload = GatewayRequestHelper::chat_payload(&self.config, request, false)?;
        let max_retries = self.config.max_retries;

        tracing::debug!(
            workspace = payload["workspace"].as_str().unwrap_or_default(),
            model = payload["model"].as_str().unwrap_or_default(),
            "sending chat request"
        );

        for attempt in 0..max_retries {
            let err = match tokio::time::timeout(
                self.config.timeout,
                self.helper.send_chat(&payload),
            )
            .await
            {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(err)) => err,
                Err(_) => GatewayError::Timeout {
                    limit: self.config.timeout,
                },
            };

            match classify(err, attempt, max_retries, self.config.retry_initial_delay) {
                Disposition::Fail(err) => return Err(err),
                Disposition::Retry { delay, err } => {
                    tracing::warn!(
                        error = %err,
                        status = err.status().map(u64::from),
                        attempt = attempt + 1,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "chat attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        // max_retries >= 1 is validated, so the loop always returns; this
        // only satisfies the compiler.
        Err(GatewayError::RetriesExhausted {
            attempts: max_retries,
            last_error: "no attempt was made".to_string(),
        })
    }

    /// Send a chat request and get a lazy stream of decoded events.
    ///
    /// `stream: true` is forced regardless of the request. The configured
    /// timeout bounds connection establishment only, not the life of the
    /// stream. Unlike [`chat`](Self::chat), a failed initial response is
    /// terminal; there is no retry. Dropping the stream releases the
    /// underlying connection even if the consumer stops reading early.
    pub fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> BoxStream<'static, Result<ChatStreamEvent, GatewayError>> {
        let payload = match GatewayRequestHelper::chat_payload(&self.config, request, true) {
            Ok(payload) => payload,
            Err(err) => return Box::pin(stream::once(async move { Err(err) })),
        };

        let pending = self.helper.stream_request(&payload);
        let limit = self.config.timeout;

        Box::pin(try_stream! {
            let response = match tokio::time::timeout(limit, pending.send()).await {
                Ok(sent) => sent?,
                Err(_) => Err(GatewayError::Timeout { limit })?,
            };

            let status = response.status();
            if !status.is_success() {
                Err(error::error_from_response(response).await)?;
            } else {
                let mut parser = SseParser::new(response);
                while let Some(event) = parser.next_event::<ChatStreamEvent>().await? {
                    yield event;
                }
            }
        })
    }
}

impl fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
