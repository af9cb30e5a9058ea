//! Mediascope CLI: submit images and videos to the analysis service.
//!
//! Set MEDIASCOPE_API_URL (or API_BASE_URL). Ctrl-C cancels an upload in flight.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mediascope_api_client::{ApiClient, PreviewFile, SubmitOptions};
use mediascope_cli::{describe_estimate, init_tracing, progress_line, render_video};
use mediascope_core::{
    AnalysisMode, AnalysisResult, ErrorMetadata, MediaFile, MediaKind, TimeoutPolicy,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mediascope", about = "Mediascope analysis CLI")]
struct Cli {
    /// Print the raw result as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Stage a temporary preview copy of the file while it uploads
    #[arg(long, global = true)]
    preview: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an image (jpeg, png, gif; up to 20 MB)
    Image {
        /// Path to the image
        file: PathBuf,
    },
    /// Analyze a video (mp4, mov, webm, avi; up to 5 GB)
    Video {
        /// Path to the video
        file: PathBuf,
        /// Analysis mode: detailed, overview, interaction_tracking
        #[arg(long, default_value = "detailed")]
        mode: AnalysisMode,
    },
    /// Analyze a file, choosing image or video from its extension
    Analyze {
        /// Path to the file
        file: PathBuf,
        /// Analysis mode for videos
        #[arg(long, default_value = "detailed")]
        mode: AnalysisMode,
    },
    /// Show the deadline a video upload would get
    Estimate {
        /// Size in bytes
        #[arg(long, conflicts_with = "file")]
        size: Option<u64>,
        /// Read the size from this file
        file: Option<PathBuf>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize result")?;
    println!("{}", out);
    Ok(())
}

async fn load(path: &Path) -> anyhow::Result<MediaFile> {
    MediaFile::from_path(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))
}

async fn run_submission(
    client: &ApiClient,
    file: MediaFile,
    options: SubmitOptions,
    cli: &Cli,
) -> anyhow::Result<()> {
    let orchestrator = client.orchestrator();
    if cli.preview {
        let preview = PreviewFile::stage(&file)
            .await
            .context("Failed to stage preview")?;
        if let Some(path) = preview.path() {
            eprintln!("Preview: {}", path.display());
        }
        orchestrator.hold_resource(preview);
    }

    let cancel = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling...");
            cancel.cancel();
        }
    });

    tracing::info!(file = %file.name(), kind = %options.kind, "Submitting");

    let outcome = orchestrator
        .submit(file, |event| eprintln!("{}", progress_line(event)), options)
        .await;

    match outcome {
        Ok(result) if cli.json => print_json(&result),
        Ok(AnalysisResult::Image(image)) => print_json(&image),
        Ok(AnalysisResult::Video(video)) => {
            println!("{}", render_video(&video));
            Ok(())
        }
        Err(err) => {
            let hint = if err.is_retriable() {
                " You can try again."
            } else {
                ""
            };
            bail!("{}{}", err.client_message(), hint)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if let Commands::Estimate { size, file } = &cli.command {
        let size = match (size, file) {
            (Some(size), _) => *size,
            (None, Some(path)) => load(path).await?.size(),
            (None, None) => bail!("Provide --size or a file path"),
        };
        println!("{}", describe_estimate(size, &TimeoutPolicy::default()));
        return Ok(());
    }

    let client = ApiClient::from_env()
        .context("Failed to create API client. Check MEDIASCOPE_API_URL (or API_BASE_URL)")?;

    match &cli.command {
        Commands::Image { file } => {
            let file = load(file).await?;
            run_submission(&client, file, SubmitOptions::image(), &cli).await?;
        }
        Commands::Video { file, mode } => {
            let file = load(file).await?;
            run_submission(&client, file, SubmitOptions::video(*mode), &cli).await?;
        }
        Commands::Analyze { file: path, mode } => {
            let kind = client
                .config()
                .constraints
                .detect_kind(path)
                .with_context(|| {
                    format!("Cannot tell whether {} is an image or a video", path.display())
                })?;
            let file = load(path).await?;
            let options = match kind {
                MediaKind::Image => SubmitOptions::image(),
                MediaKind::Video => SubmitOptions::video(*mode),
            };
            run_submission(&client, file, options, &cli).await?;
        }
        Commands::Estimate { .. } => {}
    }

    Ok(())
}
