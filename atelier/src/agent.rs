//! Tool-orchestration loop.
//!
//! [`ImageAgent`] drives the remote model through repeated
//! search-then-decide steps and a final image generation:
//!
//! 1. Send the transcript plus the two tool declarations to the model
//! 2. Append the assistant message
//! 3. No tool calls requested — the run is done
//! 4. Otherwise dispatch each call sequentially and append its result
//! 5. Loop back to step 1
//!
//! The loop is a bounded state machine: the search budget and the step
//! ceiling are enforced in code, so the tool-usage policy in the system
//! prompt is a hint to the model rather than the enforcement mechanism.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::StudioConfig;
use crate::error::{Error, Result, ToolError};
use crate::image::{GeneratedImage, GenerationRequest, ImageGenerator};
use crate::message::{ChatMessage, ToolCall};
use crate::provider::{GenerateOptions, Model};
use crate::search::InfoSearch;
use crate::tool::{self, GenerateArgs, SearchArgs, ToolInvocation};

/// Phase of an agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Gathering material; `completed` searches done so far.
    Searching {
        /// Number of completed search calls.
        completed: usize,
    },
    /// At least one image generation has been dispatched.
    Generating,
    /// The model answered without requesting a tool.
    Done,
}

/// Result of a completed agent run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final textual response from the model, if any.
    pub content: Option<String>,
    /// The full conversation transcript.
    pub transcript: Vec<ChatMessage>,
    /// All images produced during the run, in generation order.
    pub images: Vec<GeneratedImage>,
    /// Number of reasoning steps taken.
    pub steps: usize,
    /// Number of information searches performed.
    pub searches: usize,
}

/// Defaults applied to every image generation dispatched by the agent.
///
/// The model-facing `generateImage` tool only carries a prompt; aspect
/// ratio, scene and reference images come from the originating request.
#[derive(Debug, Clone)]
pub struct GenerationDefaults {
    /// Target aspect ratio.
    pub aspect_ratio: String,
    /// Optional scene template key.
    pub scene: Option<String>,
    /// Reference images as data URLs or http(s) URLs.
    pub reference_images: Vec<String>,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            aspect_ratio: "1:1".to_string(),
            scene: None,
            reference_images: Vec::new(),
        }
    }
}

/// The orchestration agent.
#[derive(Clone)]
pub struct ImageAgent {
    model: Arc<dyn Model>,
    search: InfoSearch,
    generator: ImageGenerator,
    defaults: GenerationDefaults,
    max_steps: usize,
    max_searches: usize,
}

impl std::fmt::Debug for ImageAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAgent")
            .field("model", &self.model.model_id())
            .field("max_steps", &self.max_steps)
            .field("max_searches", &self.max_searches)
            .finish()
    }
}

impl ImageAgent {
    /// Create an agent from its chat model and tool adapters.
    #[must_use]
    pub fn new(model: Arc<dyn Model>, search: InfoSearch, generator: ImageGenerator) -> Self {
        let config = StudioConfig::default();
        Self {
            model,
            search,
            generator,
            defaults: GenerationDefaults::default(),
            max_steps: config.max_steps,
            max_searches: config.max_searches,
        }
    }

    /// Set the hard step ceiling.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the search budget.
    #[must_use]
    pub const fn with_max_searches(mut self, max_searches: usize) -> Self {
        self.max_searches = max_searches;
        self
    }

    /// Set the generation defaults applied to every `generateImage` call.
    #[must_use]
    pub fn with_defaults(mut self, defaults: GenerationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Run the agent on a single user request.
    ///
    /// Returns the final textual response, the full transcript, and every
    /// image produced along the way. Provider failures and malformed tool
    /// arguments abort the run; an unknown tool name is fed back into the
    /// transcript as a soft failure so the model can self-correct.
    pub async fn run(&self, user_message: &str) -> Result<RunOutcome> {
        if user_message.trim().is_empty() {
            return Err(Error::agent("prompt must not be empty"));
        }

        let mut transcript = vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(user_message),
        ];
        let mut images: Vec<GeneratedImage> = Vec::new();
        let mut searches = 0usize;
        let mut phase = RunPhase::Searching { completed: 0 };

        info!(model = %self.model.model_id(), max_steps = self.max_steps, "agent run started");

        for step in 1..=self.max_steps {
            debug!(step, ?phase, "requesting next action");

            let options = GenerateOptions::new()
                .with_max_tokens(4096)
                .with_tools(tool::definitions());
            let response = self.model.generate(transcript.clone(), options).await?;

            transcript.push(response.message.clone());

            if !response.message.has_tool_calls() {
                phase = RunPhase::Done;
                debug!(step, ?phase, "model returned a final answer");
                info!(steps = step, searches, images = images.len(), "agent run completed");
                return Ok(RunOutcome {
                    content: response.text(),
                    transcript,
                    images,
                    steps: step,
                    searches,
                });
            }

            // Dispatch strictly sequentially, in the order the model
            // returned the calls.
            let calls = response.message.tool_calls.clone().unwrap_or_default();
            for call in &calls {
                let result = self
                    .dispatch(call, &mut images, &mut searches, &mut phase)
                    .await?;
                transcript.push(ChatMessage::tool_response(&call.id, result));
            }
        }

        warn!(max_steps = self.max_steps, "step ceiling reached without a final answer");
        Err(Error::max_steps(self.max_steps))
    }

    /// Dispatch one tool call and return the serialized tool result.
    ///
    /// Unknown tool names become a textual result rather than an error;
    /// malformed arguments and generation failures propagate.
    async fn dispatch(
        &self,
        call: &ToolCall,
        images: &mut Vec<GeneratedImage>,
        searches: &mut usize,
        phase: &mut RunPhase,
    ) -> Result<String> {
        let invocation = match ToolInvocation::parse(call) {
            Ok(invocation) => invocation,
            Err(ToolError::UnknownTool(name)) => {
                warn!(tool = %name, "model requested an unknown tool");
                return Ok(format!("未知工具: {name}"));
            }
            Err(err) => return Err(err.into()),
        };

        match invocation {
            ToolInvocation::Search(SearchArgs { query }) => {
                if *searches >= self.max_searches {
                    warn!(max_searches = self.max_searches, "search budget exhausted");
                    return Ok(format!(
                        "The search budget ({}) is exhausted. Do not call infoSearch again; \
                         call generateImage now.",
                        self.max_searches
                    ));
                }
                *searches += 1;
                *phase = RunPhase::Searching {
                    completed: *searches,
                };
                debug!(%query, search = *searches, "dispatching information search");
                Ok(self.search.search(&query).await)
            }
            ToolInvocation::Generate(GenerateArgs { prompt }) => {
                *phase = RunPhase::Generating;
                debug!(%prompt, "dispatching image generation");

                let mut request = GenerationRequest::new(prompt)
                    .with_aspect_ratio(&self.defaults.aspect_ratio)
                    .with_reference_images(self.defaults.reference_images.clone());
                if let Some(scene) = &self.defaults.scene {
                    request = request.with_scene(scene);
                }

                let generated = self.generator.generate(&request).await?;
                let result = serde_json::to_string(&generated)?;
                images.extend(generated);
                Ok(result)
            }
        }
    }

    /// The fixed system instruction for the orchestration loop.
    fn system_prompt(&self) -> String {
        format!(
            "You are a professional lifestyle content creator and researcher. \
             Your workflow is: multi-round research, deciding whether to continue, \
             then image generation.\n\
             \n\
             Given a topic you must:\n\
             1. Analyze the user's request\n\
             2. Use the infoSearch tool to collect the material you need, possibly over several rounds\n\
             3. After each round, judge whether the material is sufficient for high-quality content; \
             if not, call infoSearch again (at most {} times in total)\n\
             4. Once the material is sufficient, call the generateImage tool\n\
             \n\
             Tools:\n\
             - infoSearch: research material, trends, background and audience interest points. \
             Input: {{\"query\": string}}. Call it whenever the material is insufficient.\n\
             - generateImage: generate an image from your prompt. Input: {{\"prompt\": string}}. \
             Call it only after the material is sufficient.\n\
             \n\
             Hard constraints:\n\
             - Never write copy or an image prompt while the material is insufficient\n\
             - Never call generateImage early\n\
             - The final tool you call must be generateImage\n\
             - Make only one tool call at a time\n\
             - The image style must feel healing, fresh, light and everyday-beautiful",
            self.max_searches
        )
    }
}
