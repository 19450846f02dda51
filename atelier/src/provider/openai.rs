//! OpenAI-compatible chat completions client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{GenerateOptions, Model, ModelResponse, TokenUsage};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::message::{ChatMessage, MessageContent, MessageRole, ToolCall};

/// Client for an OpenAI-compatible chat completions endpoint.
///
/// The client is constructed explicitly (from a [`ProviderConfig`] or the
/// builder) and passed into each component that needs it; there is no
/// process-wide singleton.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: reqwest::Client,
    api_key: Arc<str>,
    base_url: Arc<str>,
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenAIClient {
    /// Create a new client from a provider configuration.
    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::builder()
            .api_key(&config.api_key)
            .base_url(&config.base_url)
            .build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> OpenAIClientBuilder {
        OpenAIClientBuilder::default()
    }

    /// Create a completion model with the specified model ID.
    #[must_use]
    pub fn completion_model(&self, model_id: impl Into<String>) -> CompletionModel {
        CompletionModel::new(self.clone(), model_id)
    }

    /// Get the base URL for API requests.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the authorization headers for API requests.
    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .expect("invalid API key format"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

/// Builder for [`OpenAIClient`].
#[derive(Debug, Default)]
pub struct OpenAIClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl OpenAIClientBuilder {
    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL (without the `/v1` suffix).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub const fn timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Panics
    ///
    /// Panics if the API key or base URL is not set.
    #[must_use]
    pub fn build(self) -> OpenAIClient {
        let api_key = self.api_key.expect("API key is required");
        let base_url = self.base_url.expect("base URL is required");

        let mut client_builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout_secs {
            client_builder = client_builder.timeout(std::time::Duration::from_secs(timeout));
        }
        let http_client = client_builder.build().expect("failed to build HTTP client");

        OpenAIClient {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').into(),
        }
    }
}

/// Chat completion model bound to an [`OpenAIClient`].
#[derive(Clone)]
pub struct CompletionModel {
    client: OpenAIClient,
    model_id: String,
}

impl std::fmt::Debug for CompletionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionModel")
            .field("model_id", &self.model_id)
            .finish()
    }
}

impl CompletionModel {
    fn new(client: OpenAIClient, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }

    /// Build the request body for the API.
    fn build_request_body(&self, messages: &[ChatMessage], options: &GenerateOptions) -> Value {
        let mut body = serde_json::json!({
            "model": self.model_id,
            "messages": Self::convert_messages(messages),
            "stream": false,
        });

        if let Some(temp) = options.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max) = options.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }
        if let Some(top_p) = options.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }
        if let Some(penalty) = options.presence_penalty {
            body["presence_penalty"] = serde_json::json!(penalty);
        }
        if let Some(tools) = &options.tools
            && !tools.is_empty()
        {
            body["tools"] = serde_json::json!(tools);
        }

        body
    }

    /// Convert a content part to the API wire format.
    fn convert_content(content: &MessageContent) -> Value {
        match content {
            MessageContent::Text { text } => serde_json::json!({
                "type": "text",
                "text": text
            }),
            MessageContent::ImageUrl { image_url } => serde_json::json!({
                "type": "image_url",
                "image_url": {
                    "url": image_url.url,
                    "detail": image_url.detail.as_deref().unwrap_or("auto")
                }
            }),
        }
    }

    /// Convert transcript messages to the API wire format.
    fn convert_messages(messages: &[ChatMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                    MessageRole::Tool => "tool",
                };

                let mut obj = serde_json::json!({ "role": role });

                if let Some(contents) = &msg.content {
                    if contents.iter().any(MessageContent::is_image) {
                        let parts: Vec<Value> =
                            contents.iter().map(Self::convert_content).collect();
                        obj["content"] = serde_json::json!(parts);
                    } else if let Some(text) = msg.text_content() {
                        obj["content"] = serde_json::json!(text);
                    }
                }

                if let Some(tool_calls) = &msg.tool_calls {
                    let tc_json: Vec<Value> = tool_calls
                        .iter()
                        .map(|tc| {
                            serde_json::json!({
                                "id": tc.id,
                                "type": "function",
                                "function": {
                                    "name": tc.function.name,
                                    "arguments": tc.arguments_string()
                                }
                            })
                        })
                        .collect();
                    obj["tool_calls"] = serde_json::json!(tc_json);
                }

                if let Some(tool_call_id) = &msg.tool_call_id {
                    obj["tool_call_id"] = serde_json::json!(tool_call_id);
                }

                obj
            })
            .collect()
    }

    /// Parse the API response into a [`ModelResponse`].
    fn parse_response(json: Value) -> Result<ModelResponse, ProviderError> {
        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| ProviderError::response_format("no choices in response"))?;

        let message_json = &choice["message"];
        let content = message_json["content"].as_str().map(String::from);

        let tool_calls = message_json["tool_calls"].as_array().map(|tc_array| {
            tc_array
                .iter()
                .map(|tc| {
                    let id = tc["id"].as_str().unwrap_or_default().to_string();
                    let name = tc["function"]["name"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string();
                    // Arguments may arrive as a JSON string or as an object.
                    let arguments = if let Some(args_str) = tc["function"]["arguments"].as_str() {
                        serde_json::from_str(args_str)
                            .unwrap_or_else(|_| Value::String(args_str.to_string()))
                    } else {
                        tc["function"]["arguments"].clone()
                    };
                    ToolCall::new(id, name, arguments)
                })
                .collect::<Vec<_>>()
        });

        let message = ChatMessage {
            role: MessageRole::Assistant,
            content: content.map(|c| vec![MessageContent::text(c)]),
            tool_calls: tool_calls.filter(|calls| !calls.is_empty()),
            tool_call_id: None,
        };

        let token_usage = json.get("usage").map(|usage| TokenUsage {
            input_tokens: u32::try_from(usage["prompt_tokens"].as_u64().unwrap_or(0))
                .unwrap_or(u32::MAX),
            output_tokens: u32::try_from(usage["completion_tokens"].as_u64().unwrap_or(0))
                .unwrap_or(u32::MAX),
        });

        Ok(ModelResponse {
            message,
            token_usage,
            raw: Some(json),
        })
    }
}

#[async_trait]
impl Model for CompletionModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    #[instrument(skip(self, messages, options), fields(model = %self.model_id))]
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> Result<ModelResponse, ProviderError> {
        let body = self.build_request_body(&messages, &options);

        debug!("sending chat completion request");

        let response = self
            .client
            .http_client
            .post(format!("{}/v1/chat/completions", self.client.base_url))
            .headers(self.client.auth_headers())
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::http_status(status, error_text));
        }

        let json: Value = response.json().await.map_err(ProviderError::from)?;
        Self::parse_response(json)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_client() -> OpenAIClient {
        OpenAIClient::builder()
            .api_key("test-key")
            .base_url("https://llm.example.com")
            .build()
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let client = OpenAIClient::builder()
            .api_key("k")
            .base_url("https://llm.example.com/")
            .timeout_secs(30)
            .build();
        assert_eq!(client.base_url(), "https://llm.example.com");
    }

    #[test]
    fn from_config_uses_config_values() {
        let config = ProviderConfig::new("https://llm.example.com", "sk-test");
        let client = OpenAIClient::from_config(&config);
        assert_eq!(client.base_url(), "https://llm.example.com");
    }

    #[test]
    fn debug_redacts_api_key() {
        let rendered = format!("{:?}", test_client());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("test-key"));
    }

    #[test]
    fn request_body_carries_sampling_params() {
        let model = test_client().completion_model("img-model");
        let options = GenerateOptions::new()
            .with_temperature(0.5)
            .with_top_p(1.0)
            .with_presence_penalty(0.0);
        let body = model.build_request_body(&[ChatMessage::user("hi")], &options);

        assert_eq!(body["model"], "img-model");
        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["temperature"], json!(0.5));
        assert_eq!(body["top_p"], json!(1.0));
        assert_eq!(body["presence_penalty"], json!(0.0));
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn request_body_includes_tool_definitions() {
        let model = test_client().completion_model("chat-model");
        let options = GenerateOptions::new().with_tools(crate::tool::definitions());
        let body = model.build_request_body(&[ChatMessage::user("hi")], &options);

        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["name"], "infoSearch");
        assert_eq!(tools[1]["function"]["name"], "generateImage");
    }

    #[test]
    fn multimodal_message_becomes_part_array() {
        let msg = ChatMessage::with_contents(
            MessageRole::User,
            vec![
                MessageContent::text("Generate an image."),
                MessageContent::image_url("data:image/png;base64,AAAA"),
            ],
        );
        let converted = CompletionModel::convert_messages(&[msg]);
        let parts = converted[0]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn tool_message_carries_call_id() {
        let msg = ChatMessage::tool_response("call_1", "result text");
        let converted = CompletionModel::convert_messages(&[msg]);
        assert_eq!(converted[0]["role"], "tool");
        assert_eq!(converted[0]["tool_call_id"], "call_1");
        assert_eq!(converted[0]["content"], "result text");
    }

    #[test]
    fn parse_response_with_text() {
        let json = json!({
            "choices": [{"message": {"role": "assistant", "content": "hello"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        });
        let response = CompletionModel::parse_response(json).unwrap();
        assert_eq!(response.text().as_deref(), Some("hello"));
        assert_eq!(response.token_usage.unwrap().total(), 15);
        assert!(response.tool_calls().is_none());
    }

    #[test]
    fn parse_response_with_stringified_tool_call_args() {
        let json = json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_7",
                    "type": "function",
                    "function": {"name": "infoSearch", "arguments": "{\"query\":\"cats\"}"}
                }]
            }}]
        });
        let response = CompletionModel::parse_response(json).unwrap();
        let calls = response.tool_calls().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_7");
        assert_eq!(calls[0].name(), "infoSearch");
        assert_eq!(calls[0].arguments()["query"], "cats");
    }

    #[test]
    fn parse_response_without_choices_fails() {
        let err = CompletionModel::parse_response(json!({"choices": []})).unwrap_err();
        assert_eq!(err.kind, crate::error::ProviderErrorKind::ResponseFormat);
    }
}
