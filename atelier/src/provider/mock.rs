//! Scripted mock model for testing.
//!
//! Returns predefined responses in sequence without making real API calls.
//! Useful for driving the orchestration loop through tool-call scenarios.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{GenerateOptions, Model, ModelResponse};
use crate::error::ProviderError;
use crate::message::ChatMessage;

/// One scripted step of a [`MockModel`].
pub type ScriptedResponse = Result<ModelResponse, ProviderError>;

/// A scripted mock model.
///
/// Responses are consumed in order; the last one repeats once the script is
/// exhausted, so a "model that always requests tools" is a one-entry script.
pub struct MockModel {
    model_id: String,
    script: Mutex<Vec<ScriptedResponse>>,
    calls: AtomicUsize,
}

impl std::fmt::Debug for MockModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockModel")
            .field("model_id", &self.model_id)
            .field("calls", &self.calls.load(Ordering::SeqCst))
            .finish()
    }
}

impl MockModel {
    /// Create a mock model from scripted responses.
    #[must_use]
    pub fn new(script: Vec<ScriptedResponse>) -> Self {
        Self {
            model_id: "mock-model".to_string(),
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock model that answers each call with plain text.
    #[must_use]
    pub fn with_texts(texts: Vec<&str>) -> Self {
        Self::new(
            texts
                .into_iter()
                .map(|t| Ok(ModelResponse::new(ChatMessage::assistant(t))))
                .collect(),
        )
    }

    /// Create a mock model that fails every call.
    #[must_use]
    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Set a custom model ID.
    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Number of generate calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Model for MockModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(
        &self,
        _messages: Vec<ChatMessage>,
        _options: GenerateOptions,
    ) -> Result<ModelResponse, ProviderError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().expect("mock script lock poisoned");
        match script.get(index.min(script.len().saturating_sub(1))) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(err)) => Err(err.clone()),
            None => Err(ProviderError::provider("mock script is empty")),
        }
    }
}
