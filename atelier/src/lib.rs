//! Atelier - an agentic AI image generation studio
//!
//! This crate drives a remote chat-completion model through repeated
//! search-then-decide steps before a final image generation, and extracts
//! the generated images from the model's markdown output.

pub mod agent;
pub mod config;
pub mod error;
pub mod image;
pub mod message;
pub mod provider;
pub mod scene;
pub mod search;
pub mod task;
pub mod tool;

pub use agent::{GenerationDefaults, ImageAgent, RunOutcome, RunPhase};
pub use error::{Error, ProviderError, Result, ToolError};
pub use image::{GeneratedImage, GenerationRequest, ImageGenerator};
pub use search::InfoSearch;
pub use task::{Task, TaskList, TaskStatus};
