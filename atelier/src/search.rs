//! Information search tool.
//!
//! Wraps one chat completion with a fixed research prompt. Failures are
//! swallowed and converted to human-readable fallback text so the
//! orchestration loop is always fed a usable tool result.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::message::ChatMessage;
use crate::provider::{GenerateOptions, Model};

const SEARCH_SYSTEM_PROMPT: &str = "\
You are a professional research assistant. Given a query, gather the most \
recent and accurate information and organize it into structured text.
Requirements:
1. Cover the relevant, up-to-date material on the topic
2. Format the findings so they are easy to read
3. Include key figures, steps and main points
4. For how-to topics, provide detailed steps
5. For news topics, provide multiple angles";

/// Grounding tool that researches a topic through the chat model.
#[derive(Clone)]
pub struct InfoSearch {
    model: Arc<dyn Model>,
}

impl std::fmt::Debug for InfoSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfoSearch")
            .field("model", &self.model.model_id())
            .finish()
    }
}

impl InfoSearch {
    /// Create a search tool on top of the given model.
    #[must_use]
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self { model }
    }

    /// Research a topic and return structured findings as text.
    ///
    /// Never fails: an empty response or a provider error is converted to a
    /// fallback string.
    pub async fn search(&self, query: &str) -> String {
        let messages = vec![
            ChatMessage::system(SEARCH_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Research and organize detailed information about: {query}"
            )),
        ];
        let options = GenerateOptions::new().with_max_tokens(1000);

        match self.model.generate(messages, options).await {
            Ok(response) => match response.text() {
                Some(content) if !content.trim().is_empty() => {
                    debug!(chars = content.len(), "search returned findings");
                    content
                }
                _ => format!(
                    "The search for \"{query}\" returned no results; try different keywords."
                ),
            },
            Err(err) => {
                warn!(error = %err, "search call failed");
                format!("Searching for \"{query}\" failed; please try again later.")
            }
        }
    }
}
