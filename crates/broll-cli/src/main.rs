//! B-Roll Director command line.
//!
//! Analyzes a script or video into scenes, optionally drives image/video
//! generation batches over them, and exports the prompts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use broll_engine::{Director, EngineConfig};
use broll_gemini::GeminiClient;
use broll_models::{AspectRatio, GenerationMode, ImageStyle, Scene};

#[derive(Parser, Debug)]
#[command(name = "broll")]
#[command(about = "Turn a script or video into AI-generated B-roll scenes", long_about = None)]
struct Args {
    /// Script file to analyze
    #[arg(long, conflicts_with = "video")]
    script: Option<PathBuf>,

    /// Video file to analyze (recreated shot-for-shot)
    #[arg(long)]
    video: Option<PathBuf>,

    /// Reload a stored session by id instead of analyzing
    #[arg(long, conflicts_with_all = ["script", "video"])]
    resume: Option<String>,

    /// Visual style (cinematic, ancient, photorealistic, cyberpunk, anime, watercolor, minimalist)
    #[arg(long, default_value = "cinematic")]
    style: String,

    /// Target aspect ratio (1:1, 16:9, 9:16, 4:3, 3:4)
    #[arg(long, default_value = "16:9")]
    ratio: String,

    /// Generate a still for every scene
    #[arg(long)]
    images: bool,

    /// Generate a clip for every scene
    #[arg(long)]
    videos: bool,

    /// Write the prompt export to this path
    #[arg(long)]
    export: Option<PathBuf>,

    /// List stored sessions and exit
    #[arg(long)]
    history: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let style: ImageStyle = args.style.parse()?;
    let ratio: AspectRatio = args.ratio.parse()?;

    let gateway = Arc::new(GeminiClient::from_env()?);
    let config = EngineConfig::from_env();
    let director = Director::new(gateway, config)?;

    if args.history {
        for session in director.history().list()? {
            println!(
                "{}  {}  [{}] {} ({} scenes)",
                session.created_at.format("%Y-%m-%d %H:%M"),
                session.id,
                session.source,
                session.name,
                session.scenes.len()
            );
        }
        return Ok(());
    }

    if let Some(id) = &args.resume {
        let session = director.load_session(id).await?;
        info!(session = %session.name, scenes = session.scenes.len(), "Session restored");
    } else if let Some(path) = &args.script {
        let script = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        let session = director.analyze_script(&script).await?;
        info!(session = %session.name, scenes = session.scenes.len(), "Script analyzed");
    } else if let Some(path) = &args.video {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read video {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let session = director
            .analyze_video(data, mime_for(path), &file_name)
            .await?;
        info!(session = %session.name, scenes = session.scenes.len(), "Video analyzed");
    } else {
        bail!("nothing to do: pass --script, --video, --resume, or --history");
    }

    if args.images {
        let report = director
            .run_batch(GenerationMode::Image, &style, ratio)
            .await?;
        info!(
            dispatched = report.dispatched,
            completed = report.completed,
            failed = report.failed,
            "Image batch finished"
        );
    }

    if args.videos {
        let report = director
            .run_batch(GenerationMode::Video, &style, ratio)
            .await?;
        info!(
            dispatched = report.dispatched,
            completed = report.completed,
            failed = report.failed,
            "Video batch finished"
        );
    }

    print_summary(&director.scenes().await);

    if let Some(path) = &args.export {
        director.export_prompts_file(path, &style, ratio).await?;
        println!("Prompts written to {}", path.display());
    }

    Ok(())
}

fn print_summary(scenes: &[Scene]) {
    println!("\n{} scenes:", scenes.len());
    for (index, scene) in scenes.iter().enumerate() {
        let media = if scene.image_url.is_some() {
            "image"
        } else if scene.video_url.is_some() {
            "video"
        } else {
            "-"
        };
        println!(
            "{:>4}  {:<17} {:<6} {}",
            index + 1,
            scene.status.as_str(),
            media,
            truncate(&scene.original_text, 60)
        );
        if let Some(error) = &scene.error {
            println!("      error: {error}");
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        _ => "video/mp4",
    }
}
