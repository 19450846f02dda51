//! Atelier CLI - agentic AI image generation from the terminal.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use atelier::agent::{GenerationDefaults, ImageAgent};
use atelier::config::{ConfigError, ProviderConfig, StudioConfig};
use atelier::error::{Error, Result};
use atelier::provider::OpenAIClient;
use atelier::scene::{SCENE_KEYS, scene_template};
use atelier::task::Task;
use atelier::{GenerationRequest, ImageGenerator, InfoSearch};
use base64::Engine as _;
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Atelier - an agentic AI image generation studio
#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the OpenAI-compatible endpoint, without the /v1 suffix
    #[arg(long, env = "BASE_URL", global = true)]
    base_url: Option<String>,

    /// Bearer token for the endpoint
    #[arg(long, env = "API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image directly from a prompt
    Generate(GenerateArgs),

    /// Run the research-then-generate agent on a topic
    Agent(AgentArgs),

    /// List the available scene templates
    Scenes,
}

/// Arguments for the generate command
#[derive(Args)]
struct GenerateArgs {
    /// The image prompt
    prompt: String,

    /// Image model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Aspect ratio, e.g. 1:1 or 16:9
    #[arg(short, long, default_value = "1:1")]
    ratio: String,

    /// Scene template key (see 'atelier scenes')
    #[arg(short, long)]
    scene: Option<String>,

    /// Reference image file, repeatable
    #[arg(short = 'i', long = "image")]
    images: Vec<PathBuf>,
}

/// Arguments for the agent command
#[derive(Args)]
struct AgentArgs {
    /// The content topic to research and illustrate
    prompt: String,

    /// Chat model driving the loop and the search tool
    #[arg(long)]
    chat_model: Option<String>,

    /// Image model used by the generateImage tool
    #[arg(long)]
    image_model: Option<String>,

    /// Aspect ratio for generated images
    #[arg(short, long, default_value = "1:1")]
    ratio: String,

    /// Scene template key (see 'atelier scenes')
    #[arg(short, long)]
    scene: Option<String>,

    /// Reference image file, repeatable
    #[arg(short = 'i', long = "image")]
    images: Vec<PathBuf>,

    /// Maximum number of information searches per run
    #[arg(long)]
    max_searches: Option<usize>,

    /// Hard ceiling on reasoning steps per run
    #[arg(long)]
    max_steps: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "atelier={level},atelier_cli={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate(args) => {
            let provider = provider_config(cli.base_url, cli.api_key)?;
            cmd_generate(args, &provider).await
        }
        Commands::Agent(args) => {
            let provider = provider_config(cli.base_url, cli.api_key)?;
            cmd_agent(args, &provider).await
        }
        Commands::Scenes => {
            cmd_scenes();
            Ok(())
        }
    }
}

/// Resolve the provider endpoint from flags, falling back to the environment.
fn provider_config(base_url: Option<String>, api_key: Option<String>) -> Result<ProviderConfig> {
    match (base_url, api_key) {
        (Some(base_url), Some(api_key)) => Ok(ProviderConfig::new(base_url, api_key)),
        (None, _) => Err(ConfigError::MissingEnv("BASE_URL").into()),
        (_, None) => Err(ConfigError::MissingEnv("API_KEY").into()),
    }
}

/// Generate an image directly, without the agent loop.
async fn cmd_generate(args: GenerateArgs, provider: &ProviderConfig) -> Result<()> {
    let studio = StudioConfig::default();
    let model_id = args.model.unwrap_or(studio.image_model);
    let scene = validate_scene(args.scene)?;
    let reference_images = read_reference_images(&args.images)?;

    let client = OpenAIClient::from_config(provider);
    let generator = ImageGenerator::new(Arc::new(client.completion_model(&model_id)));

    let mut request = GenerationRequest::new(&args.prompt)
        .with_aspect_ratio(&args.ratio)
        .with_reference_images(reference_images);
    if let Some(scene) = scene {
        request = request.with_scene(scene);
    }

    let mut task = Task::new(&args.prompt, &model_id, &args.ratio);
    println!("Generating ({model_id}, {})...", args.ratio);

    match generator.generate(&request).await {
        Ok(images) => task.complete(images),
        Err(e) => task.fail(e.to_string()),
    }

    print_task(&task);
    Ok(())
}

/// Run the full research-then-generate agent.
async fn cmd_agent(args: AgentArgs, provider: &ProviderConfig) -> Result<()> {
    let studio = StudioConfig::default();
    let chat_model = args.chat_model.unwrap_or(studio.chat_model);
    let image_model = args.image_model.unwrap_or(studio.image_model);
    let scene = validate_scene(args.scene)?;
    let reference_images = read_reference_images(&args.images)?;

    let client = OpenAIClient::from_config(provider);
    let mut agent = ImageAgent::new(
        Arc::new(client.completion_model(&chat_model)),
        InfoSearch::new(Arc::new(client.completion_model(&chat_model))),
        ImageGenerator::new(Arc::new(client.completion_model(&image_model))),
    )
    .with_defaults(GenerationDefaults {
        aspect_ratio: args.ratio.clone(),
        scene,
        reference_images,
    });
    if let Some(max_searches) = args.max_searches {
        agent = agent.with_max_searches(max_searches);
    }
    if let Some(max_steps) = args.max_steps {
        agent = agent.with_max_steps(max_steps);
    }

    let mut task = Task::new(&args.prompt, &image_model, &args.ratio);
    println!("Running agent ({chat_model} + {image_model})...\n");

    match agent.run(&args.prompt).await {
        Ok(outcome) => {
            if let Some(content) = &outcome.content {
                println!("{content}\n");
            }
            println!(
                "Finished in {} step(s) with {} search(es).",
                outcome.steps, outcome.searches
            );
            task.complete(outcome.images);
        }
        Err(e) => task.fail(e.to_string()),
    }

    print_task(&task);
    Ok(())
}

/// List all scene templates.
fn cmd_scenes() {
    println!("Available scene templates:\n");
    for key in SCENE_KEYS {
        if let Some(template) = scene_template(key) {
            println!("  {key}");
            println!("    {template}\n");
        }
    }
}

/// Reject scene keys that do not resolve to a template.
fn validate_scene(scene: Option<String>) -> Result<Option<String>> {
    match scene {
        Some(key) if scene_template(&key).is_none() => Err(Error::agent(format!(
            "unknown scene '{key}'; run 'atelier scenes' to list the available templates"
        ))),
        other => Ok(other),
    }
}

/// Read reference image files and encode them as data URLs.
fn read_reference_images(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths.iter().map(|path| read_data_url(path)).collect()
}

/// Encode one file as a data URL with a guessed MIME type.
fn read_data_url(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::agent(format!("failed to read {}: {e}", path.display())))?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

/// Print the final state of a task.
fn print_task(task: &Task) {
    println!();
    println!("Task {}", task.id);
    println!("  Prompt: {}", task.prompt);
    println!("  Status: {:?}", task.status);
    if let Some(duration) = task.duration_secs() {
        println!("  Took:   {duration:.1}s");
    }
    if let Some(error) = &task.error {
        println!("  Error:  {error}");
    }
    for image in &task.images {
        println!("  Image:  {}", display_url(&image.url));
    }
}

/// Shorten inline data URIs for terminal display.
fn display_url(url: &str) -> String {
    if url.starts_with("data:") && url.len() > 64 {
        format!("{}... ({} chars inline)", &url[..64], url.len())
    } else {
        url.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_generate_with_flags() {
        let cli = Cli::parse_from([
            "atelier",
            "--base-url",
            "https://llm.example.com",
            "--api-key",
            "sk-test",
            "generate",
            "a cat on a bed",
            "--ratio",
            "16:9",
            "--scene",
            "cozy-life",
        ]);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.prompt, "a cat on a bed");
                assert_eq!(args.ratio, "16:9");
                assert_eq!(args.scene.as_deref(), Some("cozy-life"));
            }
            _ => panic!("expected generate subcommand"),
        }
    }

    #[test]
    fn missing_credentials_are_reported_by_name() {
        let err = provider_config(None, Some("sk-test".to_string())).unwrap_err();
        assert!(err.to_string().contains("BASE_URL"));

        let err = provider_config(Some("https://x".to_string()), None).unwrap_err();
        assert!(err.to_string().contains("API_KEY"));
    }

    #[test]
    fn unknown_scene_is_rejected() {
        assert!(validate_scene(Some("not-a-scene".to_string())).is_err());
        assert_eq!(
            validate_scene(Some("food".to_string())).unwrap().as_deref(),
            Some("food")
        );
        assert!(validate_scene(None).unwrap().is_none());
    }

    #[test]
    fn long_data_uris_are_shortened_for_display() {
        let url = format!("data:image/png;base64,{}", "A".repeat(200));
        let shown = display_url(&url);
        assert!(shown.len() < url.len());
        assert!(shown.contains("chars inline"));
        assert_eq!(display_url("https://x/y.png"), "https://x/y.png");
    }
}
