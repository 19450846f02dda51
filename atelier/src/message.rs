//! Message types for agent-model communication.
//!
//! This module defines the message format used between the orchestration
//! loop and the remote model, following the chat completion API conventions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message providing instructions.
    System,
    /// User message.
    User,
    /// Assistant (model) message.
    Assistant,
    /// Tool result message.
    Tool,
}

impl MessageRole {
    /// Get the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// Content of a message: text or an image reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
    /// Image URL content (https URL or data URL).
    #[serde(rename = "image_url")]
    ImageUrl {
        /// The image URL details.
        image_url: ImageUrlDetail,
    },
}

/// Image URL structure with optional detail level for vision APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrlDetail {
    /// The URL of the image (http(s) URL or data URL).
    pub url: String,
    /// Detail level for image processing: "low", "high", or "auto".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl MessageContent {
    /// Create a new text content.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a new image URL content.
    #[must_use]
    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrlDetail {
                url: url.into(),
                detail: None,
            },
        }
    }

    /// Get the text content if this is a text part.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::ImageUrl { .. } => None,
        }
    }

    /// Check if this is an image part.
    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self, Self::ImageUrl { .. })
    }
}

/// Function call information in a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// Name of the function to call.
    pub name: String,
    /// Arguments to pass to the function (JSON string or object).
    pub arguments: Value,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for the tool call.
    pub id: String,
    /// Type of the tool call (always "function").
    #[serde(rename = "type")]
    pub call_type: String,
    /// The function to call.
    pub function: ToolCallFunction,
}

impl ToolCall {
    /// Create a new tool call.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: ToolCallFunction {
                name: name.into(),
                arguments,
            },
        }
    }

    /// Get the name of the function being called.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Get the arguments as a JSON value.
    #[must_use]
    pub const fn arguments(&self) -> &Value {
        &self.function.arguments
    }

    /// Parse arguments as a typed value.
    ///
    /// Accepts both stringified JSON and structured arguments, since
    /// providers differ in how they return the payload.
    pub fn parse_arguments<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        match &self.function.arguments {
            Value::String(s) => serde_json::from_str(s),
            other => serde_json::from_value(other.clone()),
        }
    }

    /// Get arguments as a JSON string.
    #[must_use]
    pub fn arguments_string(&self) -> String {
        match &self.function.arguments {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

/// A chat message in a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: MessageRole,
    /// Content of the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<MessageContent>>,
    /// Tool calls made by the model (assistant messages only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Tool call ID this message responds to (tool messages only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Create a new system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(vec![MessageContent::text(content)]),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a new user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(vec![MessageContent::text(content)]),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a new assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(vec![MessageContent::text(content)]),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a new assistant message with tool calls and no content.
    #[must_use]
    pub const fn assistant_with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: None,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    /// Create a new tool result message keyed by the originating call id.
    #[must_use]
    pub fn tool_response(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(vec![MessageContent::text(content)]),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Create a new message with multiple content parts.
    #[must_use]
    pub const fn with_contents(role: MessageRole, contents: Vec<MessageContent>) -> Self {
        Self {
            role,
            content: Some(contents),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Get the concatenated text content of the message.
    #[must_use]
    pub fn text_content(&self) -> Option<String> {
        self.content.as_ref().map(|contents| {
            contents
                .iter()
                .filter_map(MessageContent::as_text)
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    /// Check if this message carries at least one tool call.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls
            .as_ref()
            .is_some_and(|calls| !calls.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(serde_json::to_string(&MessageRole::Tool).unwrap(), "\"tool\"");
        assert_eq!(MessageRole::System.as_str(), "system");
    }

    #[test]
    fn constructors_set_roles() {
        assert_eq!(ChatMessage::system("s").role, MessageRole::System);
        assert_eq!(ChatMessage::user("u").role, MessageRole::User);
        assert_eq!(ChatMessage::assistant("a").role, MessageRole::Assistant);
        assert_eq!(ChatMessage::tool_response("id", "r").role, MessageRole::Tool);
    }

    #[test]
    fn tool_response_carries_call_id() {
        let msg = ChatMessage::tool_response("call_42", "result");
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_42"));
        assert_eq!(msg.text_content().as_deref(), Some("result"));
    }

    #[test]
    fn text_content_joins_text_parts() {
        let msg = ChatMessage::with_contents(
            MessageRole::User,
            vec![
                MessageContent::text("a"),
                MessageContent::image_url("https://x/y.png"),
                MessageContent::text("b"),
            ],
        );
        assert_eq!(msg.text_content().as_deref(), Some("a\nb"));
    }

    #[test]
    fn has_tool_calls_ignores_empty_list() {
        let msg = ChatMessage::assistant_with_tool_calls(vec![]);
        assert!(!msg.has_tool_calls());

        let msg = ChatMessage::assistant_with_tool_calls(vec![ToolCall::new(
            "id1",
            "infoSearch",
            json!({"query": "q"}),
        )]);
        assert!(msg.has_tool_calls());
    }

    #[test]
    fn parse_arguments_accepts_string_and_object() {
        #[derive(Deserialize)]
        struct Args {
            query: String,
        }

        let from_obj = ToolCall::new("1", "infoSearch", json!({"query": "cats"}));
        assert_eq!(from_obj.parse_arguments::<Args>().unwrap().query, "cats");

        let from_str = ToolCall::new("2", "infoSearch", json!("{\"query\":\"dogs\"}"));
        assert_eq!(from_str.parse_arguments::<Args>().unwrap().query, "dogs");
    }

    #[test]
    fn arguments_string_round_trips() {
        let call = ToolCall::new("1", "generateImage", json!({"prompt": "a cat"}));
        assert_eq!(call.arguments_string(), "{\"prompt\":\"a cat\"}");
    }
}
