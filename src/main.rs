use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use socialdash_generator::config::Config;
use socialdash_generator::facade::{GenerationFacade, GenerationService};
use socialdash_generator::models::{
    ArtifactKind, AspectRatio, GenerationRequest, GenerationResult, Mode, Provider,
};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "socialdash-generator")]
#[command(about = "Generate an image or video through an external provider")]
struct CliArgs {
    /// Provider slug, e.g. video_queue or image_studio.
    #[arg(long, value_parser = parse_provider_arg)]
    provider: Provider,

    /// Generation mode: text-to-image, text-to-video, image-to-video or audio-driven-avatar.
    #[arg(long, value_parser = parse_mode_arg)]
    mode: Mode,

    #[arg(long)]
    prompt: String,

    /// URL of the source image for image-driven modes.
    #[arg(long)]
    source: Option<String>,

    /// URL of the driving audio for avatar generation.
    #[arg(long)]
    audio: Option<String>,

    #[arg(long, value_parser = parse_ratio_arg, default_value = "1:1")]
    ratio: AspectRatio,

    /// Requested clip length in seconds.
    #[arg(long)]
    duration: Option<u32>,

    /// Append successful generations to this JSON-lines file.
    #[arg(long, value_name = "FILE")]
    history: Option<PathBuf>,
}

fn parse_provider_arg(input: &str) -> std::result::Result<Provider, String> {
    input.parse()
}

fn parse_mode_arg(input: &str) -> std::result::Result<Mode, String> {
    input.parse()
}

fn parse_ratio_arg(input: &str) -> std::result::Result<AspectRatio, String> {
    input.parse()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEntry<'a> {
    prompt: &'a str,
    artifact_url: &'a str,
    artifact_kind: ArtifactKind,
    timestamp: String,
}

fn build_request(args: &CliArgs) -> socialdash_generator::Result<GenerationRequest> {
    let mut builder = GenerationRequest::builder(args.provider, args.mode, args.prompt.clone())
        .aspect_ratio(args.ratio);
    if let Some(source) = &args.source {
        builder = builder.source_artifact(source.clone());
    }
    if let Some(audio) = &args.audio {
        builder = builder.audio_artifact(audio.clone());
    }
    if let Some(duration) = args.duration {
        builder = builder.duration_seconds(duration);
    }
    builder.build()
}

fn append_history(path: &Path, prompt: &str, result: &GenerationResult) -> Result<()> {
    let Some(artifact_url) = result.artifact_url() else {
        return Ok(());
    };

    let entry = HistoryEntry {
        prompt,
        artifact_url,
        artifact_kind: result.artifact_kind(),
        timestamp: Utc::now().to_rfc3339(),
    };
    let line = serde_json::to_string(&entry)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open history file {}", path.display()))?;
    writeln!(file, "{}", line)?;
    Ok(())
}

async fn run(args: &CliArgs, service: &dyn GenerationService) -> Result<GenerationResult> {
    let request = build_request(args)?;
    let result = service.generate(&request).await;

    if result.success() {
        if let Some(path) = &args.history {
            append_history(path, request.prompt(), &result)?;
            info!("Recorded generation in {}", path.display());
        }
    }

    Ok(result)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "socialdash_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    info!("Starting socialdash-generator for {}", args.provider);

    let facade = match Config::from_env().and_then(|config| GenerationFacade::from_config(&config))
    {
        Ok(facade) => facade,
        Err(e) => {
            error!("Failed to initialize generator: {}", e);
            std::process::exit(1);
        }
    };

    match run(&args, &facade).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            if result.success() {
                info!("Generation completed successfully");
                Ok(())
            } else {
                error!("Generation failed: {}", result.message().unwrap_or("unknown error"));
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Generation failed: {}", e);
            std::process::exit(1);
        }
    }
}
