use bon::Builder;
use serde::{Deserialize, Serialize};

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a conversation. Ordering is owned by the caller; a system
/// message conventionally comes first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request for chat completion
///
/// Unset fields fall back to client-level defaults when the request is sent:
/// the configured workspace and model slugs, `temperature` 0.0, `max_tokens`
/// 1500, `top_p` 1.0, empty `metadata`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Builder)]
#[builder(builder_type(vis = "pub"), state_mod(vis = "pub"))]
pub struct ChatRequest {
    /// List of messages in the conversation
    #[builder(field)]
    pub messages: Vec<ChatMessage>,

    /// Workspace override for this request
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub workspace: Option<String>,

    /// Model override for this request
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub model: Option<String>,

    /// Opaque caller metadata forwarded to the gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,

    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Top-p sampling parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

// Builder extensions for convenience methods
impl<S: chat_request_builder::State> ChatRequestBuilder<S> {
    /// Add a system message
    pub fn system_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::system(content));
        self
    }

    /// Add a user message
    pub fn user_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::user(content));
        self
    }

    /// Add an assistant message
    pub fn assistant_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::assistant(content));
        self
    }

    /// Add a message
    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_message_order() {
        let request = ChatRequest::builder()
            .system_message("be terse")
            .user_message("hi")
            .assistant_message("hello")
            .user_message("bye")
            .build();

        let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
    }

    #[test]
    fn roles_serialize_lowercase() {
        let rendered = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(rendered, "{\"role\":\"user\",\"content\":\"hi\"}");
    }

    #[test]
    fn unset_options_are_omitted_from_json() {
        let request = ChatRequest::builder().user_message("hi").build();
        let value = serde_json::to_value(&request).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("messages"));
        assert!(!obj.contains_key("temperature"));
        assert!(!obj.contains_key("workspace"));
        assert!(!obj.contains_key("stream"));
    }
}
