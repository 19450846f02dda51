//! Tool declarations and argument validation.
//!
//! The studio exposes a closed set of two tools to the model: information
//! search and image generation. Model-facing declarations follow OpenAI's
//! function-calling format; incoming calls are validated at the loop
//! boundary into the [`ToolInvocation`] tagged union before dispatch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::message::ToolCall;

/// Name of the information search tool.
pub const INFO_SEARCH: &str = "infoSearch";

/// Name of the image generation tool.
pub const GENERATE_IMAGE: &str = "generateImage";

/// Definition of a tool for model-facing function calling.
///
/// Serializes to `{"type": "function", "function": {name, description,
/// parameters}}`. The parameter schema informs the remote model only; local
/// validation happens through [`ToolInvocation::parse`].
#[derive(Debug, Clone, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool.
    pub name: String,
    /// Description of what the tool does.
    pub description: String,
    /// JSON schema for the tool's parameters.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Returns the tool name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Serialize for ToolDefinition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut function = serde_json::Map::new();
        function.insert("name".to_owned(), Value::String(self.name.clone()));
        function.insert(
            "description".to_owned(),
            Value::String(self.description.clone()),
        );
        function.insert("parameters".to_owned(), self.parameters.clone());

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", "function")?;
        map.serialize_entry("function", &function)?;
        map.end()
    }
}

/// The two tool declarations exposed to the model on every step.
#[must_use]
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            INFO_SEARCH,
            "Search for background material, trends, inspiration and audience interest points on a topic.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The topic to research"
                    }
                },
                "required": ["query"]
            }),
        ),
        ToolDefinition::new(
            GENERATE_IMAGE,
            "Generate a lifestyle-aesthetic image from the given prompt.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "The image generation prompt"
                    }
                },
                "required": ["prompt"]
            }),
        ),
    ]
}

/// Arguments for the information search tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchArgs {
    /// The topic to research.
    pub query: String,
}

/// Arguments for the image generation tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateArgs {
    /// The image generation prompt.
    pub prompt: String,
}

/// A validated tool invocation.
///
/// The closed set of tools is represented as a tagged union rather than a
/// string-keyed dispatch table, so an unknown name and a malformed payload
/// surface as distinct error kinds.
#[derive(Debug, Clone)]
pub enum ToolInvocation {
    /// An information search request.
    Search(SearchArgs),
    /// An image generation request.
    Generate(GenerateArgs),
}

impl ToolInvocation {
    /// Validate a raw tool call into a typed invocation.
    pub fn parse(call: &ToolCall) -> Result<Self, ToolError> {
        match call.name() {
            INFO_SEARCH => call
                .parse_arguments::<SearchArgs>()
                .map(Self::Search)
                .map_err(|e| ToolError::invalid_args(format!("{INFO_SEARCH}: {e}"))),
            GENERATE_IMAGE => call
                .parse_arguments::<GenerateArgs>()
                .map(Self::Generate)
                .map_err(|e| ToolError::invalid_args(format!("{GENERATE_IMAGE}: {e}"))),
            other => Err(ToolError::unknown(other)),
        }
    }
}
