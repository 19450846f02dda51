//! Image generation tool.
//!
//! Wraps one chat completion whose response embeds generated images as
//! markdown image links, and extracts them into [`GeneratedImage`] values.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Error;
use crate::message::{ChatMessage, MessageContent, MessageRole};
use crate::provider::{GenerateOptions, Model};
use crate::scene::scene_template;

/// Markdown image syntax carrying either an http(s) URL or an inline data URI.
static IMAGE_MARKDOWN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[image\]\(((?:https?://[^)]+|data:image/[^;]+;base64,[^)]+))\)")
        .expect("image markdown regex is valid")
});

/// A generated image reference with the prompt that produced it.
///
/// The remote model's own revised prompt, if any, is discarded; the label is
/// always the original input prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Remote URL or inline data URI of the image.
    pub url: String,
    /// The originating prompt text.
    pub prompt: String,
}

/// One image generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The image generation prompt.
    pub prompt: String,
    /// Target aspect ratio, e.g. "1:1" or "16:9".
    pub aspect_ratio: String,
    /// Optional scene template key.
    pub scene: Option<String>,
    /// Reference images as data URLs or http(s) URLs.
    pub reference_images: Vec<String>,
}

impl GenerationRequest {
    /// Create a request with the default 1:1 aspect ratio.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: "1:1".to_string(),
            scene: None,
            reference_images: Vec::new(),
        }
    }

    /// Set the aspect ratio.
    #[must_use]
    pub fn with_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = ratio.into();
        self
    }

    /// Set the scene template key.
    #[must_use]
    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self
    }

    /// Set the reference images.
    #[must_use]
    pub fn with_reference_images(mut self, images: Vec<String>) -> Self {
        self.reference_images = images;
        self
    }
}

/// Image generation tool backed by a multimodal chat model.
#[derive(Clone)]
pub struct ImageGenerator {
    model: Arc<dyn Model>,
}

impl std::fmt::Debug for ImageGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageGenerator")
            .field("model", &self.model.model_id())
            .finish()
    }
}

impl ImageGenerator {
    /// Create a generator on top of the given model.
    #[must_use]
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self { model }
    }

    /// Generate images for the given request.
    ///
    /// Transport and API failures propagate; a response without any image
    /// markdown yields an empty list, which callers must treat as a
    /// non-fatal failed generation rather than an error.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedImage>, Error> {
        let contents = build_contents(request);
        let message = ChatMessage::with_contents(MessageRole::User, contents);

        let options = GenerateOptions::new()
            .with_temperature(0.5)
            .with_top_p(1.0)
            .with_presence_penalty(0.0);

        let response = self.model.generate(vec![message], options).await?;

        let text = response.text().unwrap_or_default();
        let images: Vec<GeneratedImage> = extract_image_urls(&text)
            .into_iter()
            .map(|url| GeneratedImage {
                url,
                prompt: request.prompt.clone(),
            })
            .collect();

        if images.is_empty() {
            warn!(model = %self.model.model_id(), "response contained no image markdown");
        } else {
            debug!(count = images.len(), "extracted generated images");
        }

        Ok(images)
    }
}

/// Build the multimodal content parts for a generation request.
///
/// One instruction text part, optionally prefixed by the scene template,
/// followed by one image part per non-blank reference image.
fn build_contents(request: &GenerationRequest) -> Vec<MessageContent> {
    let instruction = format!(
        "Generate an image. {}. Output as a single complete image with aspect ratio {}. \
         Do not include any text, watermark, or explanation in the response.",
        request.prompt, request.aspect_ratio
    );

    let text = match request.scene.as_deref().and_then(scene_template) {
        Some(template) => format!("{template} {instruction}"),
        None => instruction,
    };

    let mut contents = vec![MessageContent::text(text)];
    contents.extend(
        request
            .reference_images
            .iter()
            .filter(|image| !image.trim().is_empty())
            .map(MessageContent::image_url),
    );
    contents
}

/// Extract every markdown image URL from the text, in source order.
///
/// Recognizes `![image](https://...)` and `![image](data:image/...;base64,...)`.
#[must_use]
pub fn extract_image_urls(text: &str) -> Vec<String> {
    IMAGE_MARKDOWN
        .captures_iter(text)
        .map(|captures| captures[1].to_string())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::mock::MockModel;
    use crate::provider::ModelResponse;

    #[test]
    fn extracts_single_https_url() {
        let urls = extract_image_urls("foo ![image](https://x/y.png) bar");
        assert_eq!(urls, vec!["https://x/y.png"]);
    }

    #[test]
    fn extracts_multiple_urls_in_source_order() {
        let text = "![image](https://x/1.png) middle ![image](https://x/2.png)";
        let urls = extract_image_urls(text);
        assert_eq!(urls, vec!["https://x/1.png", "https://x/2.png"]);
    }

    #[test]
    fn zero_matches_yield_empty_list() {
        assert!(extract_image_urls("no images here").is_empty());
        assert!(extract_image_urls("").is_empty());
    }

    #[test]
    fn extracts_data_uri() {
        let urls = extract_image_urls("![image](data:image/png;base64,AAAA)");
        assert_eq!(urls, vec!["data:image/png;base64,AAAA"]);
    }

    #[test]
    fn ignores_other_markdown_links() {
        let text = "[link](https://x/page) ![photo](https://x/y.png)";
        assert!(extract_image_urls(text).is_empty());
    }

    #[test]
    fn contents_include_instruction_and_ratio() {
        let request = GenerationRequest::new("a castle courtyard").with_aspect_ratio("16:9");
        let contents = build_contents(&request);
        assert_eq!(contents.len(), 1);
        let text = contents[0].as_text().unwrap();
        assert!(text.contains("a castle courtyard"));
        assert!(text.contains("aspect ratio 16:9"));
        assert!(text.contains("Do not include any text, watermark"));
    }

    #[test]
    fn scene_template_is_prepended() {
        let request = GenerationRequest::new("bento box").with_scene("food");
        let contents = build_contents(&request);
        let text = contents[0].as_text().unwrap();
        assert!(text.starts_with("Style:"));
        assert!(text.contains("Generate an image. bento box."));
    }

    #[test]
    fn unknown_scene_key_adds_no_prefix() {
        let request = GenerationRequest::new("bento box").with_scene("not-a-scene");
        let contents = build_contents(&request);
        assert!(contents[0].as_text().unwrap().starts_with("Generate an image."));
    }

    #[test]
    fn blank_reference_images_are_omitted() {
        let request = GenerationRequest::new("a cat")
            .with_reference_images(vec![String::new(), "  ".to_string()]);
        let contents = build_contents(&request);
        assert_eq!(contents.len(), 1);
        assert!(contents[0].as_text().is_some());
    }

    #[test]
    fn reference_images_become_image_parts() {
        let request = GenerationRequest::new("a cat")
            .with_reference_images(vec!["data:image/jpeg;base64,QUJD".to_string()]);
        let contents = build_contents(&request);
        assert_eq!(contents.len(), 2);
        assert!(contents[1].is_image());
    }

    #[tokio::test]
    async fn generate_labels_images_with_input_prompt() {
        let model = MockModel::with_texts(vec![
            "Here you go: ![image](https://img.example.com/out.png)",
        ]);
        let generator = ImageGenerator::new(Arc::new(model));

        let images = generator
            .generate(&GenerationRequest::new("a cat on a bed"))
            .await
            .unwrap();

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "https://img.example.com/out.png");
        assert_eq!(images[0].prompt, "a cat on a bed");
    }

    #[tokio::test]
    async fn generate_with_no_matches_is_ok_and_empty() {
        let model = MockModel::new(vec![Ok(ModelResponse::new(ChatMessage::assistant(
            "sorry, no image",
        )))]);
        let generator = ImageGenerator::new(Arc::new(model));

        let images = generator
            .generate(&GenerationRequest::new("a cat"))
            .await
            .unwrap();
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn generate_propagates_provider_failure() {
        let model = MockModel::failing(crate::error::ProviderError::http_status(502, "bad"));
        let generator = ImageGenerator::new(Arc::new(model));

        let err = generator
            .generate(&GenerationRequest::new("a cat"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }
}
