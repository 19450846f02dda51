//! Provider abstractions for remote chat-completion models.
//!
//! The [`Model`] trait is the single seam between the orchestration loop,
//! the tool adapters, and the concrete provider implementation. Production
//! code uses the OpenAI-compatible client in [`openai`]; tests use the
//! scripted [`mock::MockModel`].

pub mod mock;
pub mod openai;

use crate::error::ProviderError;
use crate::message::{ChatMessage, ToolCall};
use crate::tool::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use openai::{OpenAIClient, OpenAIClientBuilder};

/// Token usage information from a model response.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    /// Number of tokens in the input/prompt.
    pub input_tokens: u32,
    /// Number of tokens in the output/completion.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Create new token usage with the given counts.
    #[must_use]
    pub const fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Get the total token count.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Response from a model generation call.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// The generated assistant message.
    pub message: ChatMessage,
    /// Token usage information, when the provider reports it.
    pub token_usage: Option<TokenUsage>,
    /// Raw response body (provider-specific).
    pub raw: Option<serde_json::Value>,
}

impl ModelResponse {
    /// Create a new model response.
    #[must_use]
    pub const fn new(message: ChatMessage) -> Self {
        Self {
            message,
            token_usage: None,
            raw: None,
        }
    }

    /// Set token usage.
    #[must_use]
    pub const fn with_token_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage = Some(usage);
        self
    }

    /// Get the text content of the response.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.message.text_content()
    }

    /// Get the tool calls of the response, if any.
    #[must_use]
    pub const fn tool_calls(&self) -> Option<&Vec<ToolCall>> {
        self.message.tool_calls.as_ref()
    }
}

/// Options for a single generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling.
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Top-p (nucleus) sampling parameter.
    pub top_p: Option<f32>,
    /// Presence penalty.
    pub presence_penalty: Option<f32>,
    /// Tool definitions exposed to the model for function calling.
    pub tools: Option<Vec<ToolDefinition>>,
}

impl GenerateOptions {
    /// Create new default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set max tokens.
    #[must_use]
    pub const fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set top-p sampling.
    #[must_use]
    pub const fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set presence penalty.
    #[must_use]
    pub const fn with_presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    /// Set available tools for function calling.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// The core trait for remote chat-completion models.
///
/// Every call is a single blocking (non-streaming) round-trip; the system
/// issues one request at a time and does not retry.
#[async_trait]
pub trait Model: Send + Sync {
    /// The model identifier sent with each request.
    fn model_id(&self) -> &str;

    /// Generate one completion for the given transcript.
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> Result<ModelResponse, ProviderError>;
}
