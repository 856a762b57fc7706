use anyllm_common::{
    AuthMethod, Endpoint, GatewayError, HttpMethod, RequestBuilder, RequestConfig,
};
use serde::Serialize;

use crate::{ChatMessage, ChatRequest, ChatResponse, GatewayConfig};

const CHAT_URL: &str = "v1/chat";

/// Gateway dispatch helper built on the common RequestBuilder
pub(crate) struct GatewayRequestHelper {
    request_builder: RequestBuilder,
}

/// Outbound body with client-level defaults merged in. Always fully
/// populated: the gateway contract does not treat absent fields as defaults.
#[derive(Serialize)]
struct OutboundChat<'a> {
    workspace: &'a str,
    model: &'a str,
    messages: &'a [ChatMessage],
    metadata: &'a serde_json::Map<String, serde_json::Value>,
    stream: bool,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

impl GatewayRequestHelper {
    pub fn new(client: reqwest::Client, config: &GatewayConfig) -> Self {
        let request_config = RequestConfig::new(&config.base_url)
            .with_auth(AuthMethod::Bearer(config.api_key.clone()));

        Self {
            request_builder: RequestBuilder::new(client, request_config),
        }
    }

    /// Merge request-level overrides onto config defaults.
    ///
    /// `force_stream` is set on the streaming path regardless of what the
    /// caller put in the request.
    pub fn chat_payload(
        config: &GatewayConfig,
        request: &ChatRequest,
        force_stream: bool,
    ) -> Result<serde_json::Value, GatewayError> {
        let empty_metadata = serde_json::Map::new();
        let outbound = OutboundChat {
            workspace: request.workspace.as_deref().unwrap_or(&config.workspace_slug),
            model: request.model.as_deref().unwrap_or(&config.model_slug),
            messages: &request.messages,
            metadata: request.metadata.as_ref().unwrap_or(&empty_metadata),
            stream: force_stream || request.stream.unwrap_or(false),
            temperature: request.temperature.unwrap_or(0.0),
            max_tokens: request.max_tokens.unwrap_or(1500),
            top_p: request.top_p.unwrap_or(1.0),
        };

        Ok(serde_json::to_value(&outbound)?)
    }

    /// One non-streaming chat attempt
    pub async fn send_chat(
        &self,
        payload: &serde_json::Value,
    ) -> Result<ChatResponse, GatewayError> {
        let endpoint = Endpoint::new(CHAT_URL, HttpMethod::Post);
        self.request_builder.request_json(&endpoint, Some(payload)).await
    }

    /// Prepared (unsent) streaming request
    pub fn stream_request(&self, payload: &serde_json::Value) -> reqwest::RequestBuilder {
        let endpoint = Endpoint::new(CHAT_URL, HttpMethod::Post);
        self.request_builder.build_request(&endpoint).json(payload)
    }
}
