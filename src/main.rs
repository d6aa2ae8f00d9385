use anyhow::Result;
use clap::{Parser, Subcommand};
use image::ImageReader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arcade_tracker::leaderboard::{is_valid_name, NAME_LENGTH};
use arcade_tracker::{
    ArcadeConfig, AutoPilot, CsvLeaderboard, FrameSource, GameInput, ImageDirectorySource,
    LandmarkRecording, LandmarkSource, LaunchContext, LeaderboardStore, Minigame, PoseRecording,
    PoseSource, Resolution, TrackingPipeline,
};

#[derive(Parser)]
#[command(name = "arcade_tracker")]
#[command(about = "Camera-driven arcade minigames with optical pointer tracking")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML settings file; defaults apply when omitted
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a minigame from recorded camera frames, hand landmarks or poses
    Play {
        #[arg(value_enum)]
        game: Minigame,

        /// Directory of camera frames, replayed in name order
        #[arg(long, value_name = "DIR")]
        frames: Option<PathBuf>,

        /// YAML recording of per-tick hand landmarks
        #[arg(long, value_name = "FILE")]
        landmarks: Option<PathBuf>,

        /// YAML recording of per-tick body poses
        #[arg(long, value_name = "FILE")]
        poses: Option<PathBuf>,

        /// Directory holding the leaderboard tables
        #[arg(long, value_name = "DIR")]
        scores: Option<PathBuf>,

        /// Initials entered when a score makes the table
        #[arg(long, default_value = "AAA", value_parser = parse_initials)]
        name: String,

        /// Save per-tick masks to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,

        /// Stop after the first game instead of following its hand-off
        #[arg(long)]
        no_follow_up: bool,
    },
    /// Print a game's leaderboard
    Scores {
        #[arg(value_enum)]
        game: Minigame,

        #[arg(long, value_name = "DIR")]
        scores: PathBuf,
    },
    /// Run segmentation and blob extraction on a single image
    Inspect {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Save the segmentation mask here
        #[arg(long, value_name = "FILE")]
        mask_out: Option<PathBuf>,
    },
}

fn parse_initials(value: &str) -> Result<String, String> {
    if is_valid_name(value) {
        Ok(value.to_ascii_uppercase())
    } else {
        Err(format!("expected {} letters or digits", NAME_LENGTH))
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose {
        "arcade_tracker=debug"
    } else {
        "arcade_tracker=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = match &args.config {
        Some(path) => {
            let config = ArcadeConfig::load(path)?;
            info!(path = %path.display(), "Configuration loaded");
            config
        }
        None => ArcadeConfig::default(),
    };

    match args.command {
        Command::Play {
            game,
            frames,
            landmarks,
            poses,
            scores,
            name,
            debug_out,
            no_follow_up,
        } => play(
            config,
            game,
            frames,
            landmarks,
            poses,
            scores,
            name,
            debug_out,
            no_follow_up,
        ),
        Command::Scores { game, scores } => print_scores(game, scores),
        Command::Inspect {
            image_path,
            mask_out,
        } => inspect(config, image_path, mask_out),
    }
}

#[allow(clippy::too_many_arguments)]
fn play(
    config: ArcadeConfig,
    game: Minigame,
    frames: Option<PathBuf>,
    landmarks: Option<PathBuf>,
    poses: Option<PathBuf>,
    scores: Option<PathBuf>,
    name: String,
    debug_out: Option<PathBuf>,
    no_follow_up: bool,
) -> Result<()> {
    let frames = match frames {
        Some(dir) => Some(Box::new(ImageDirectorySource::open(dir)?) as Box<dyn FrameSource + Send>),
        None => None,
    };
    let landmarks = match landmarks {
        Some(path) => Some(Box::new(LandmarkRecording::load(path)?) as Box<dyn LandmarkSource>),
        None => None,
    };
    let poses = match poses {
        Some(path) => Some(Box::new(PoseRecording::load(path)?) as Box<dyn PoseSource>),
        None => None,
    };

    let mut ctx = LaunchContext {
        config,
        frames,
        landmarks,
        poses,
        input: Box::new(AutoPilot::new(name)),
        scores_dir: scores,
        debug_dir: debug_out,
    };

    let mut next = Some(game);
    while let Some(game) = next.take() {
        let report = game.launch(&mut ctx)?;

        println!("\n=== {} ===", game.namespace());
        println!("Final state: {:?}", report.state);
        if let Some(outcome) = report.outcome {
            println!("Outcome: {:?}", outcome);
        }
        println!("Score: {}", report.score);
        println!(
            "Ticks: {} ({} skipped)",
            report.ticks, report.skipped_ticks
        );
        if !report.table.is_empty() {
            println!("\nLeaderboard:");
            for (rank, entry) in report.table.iter().enumerate() {
                println!("  {:>2}. {} {}", rank + 1, entry.name, entry.score);
            }
        }

        if no_follow_up {
            break;
        }
        if let Some(follow_up) = report.follow_up {
            let ready = match follow_up.input() {
                GameInput::Camera => ctx.frames.is_some(),
                GameInput::Hands => ctx.landmarks.is_some(),
                GameInput::Pose => ctx.poses.is_some(),
            };
            if ready {
                next = Some(follow_up);
            } else {
                info!(game = follow_up.namespace(), "No input recorded for the follow-up game");
            }
        }
    }

    Ok(())
}

fn print_scores(game: Minigame, dir: PathBuf) -> Result<()> {
    let store = CsvLeaderboard::for_game(&dir, game.namespace());
    let table = store.read_top()?;

    println!("\n=== {} leaderboard ===", game.namespace());
    if table.is_empty() {
        println!("No scores recorded.");
    }
    for (rank, entry) in table.iter().enumerate() {
        println!("  {:>2}. {} {}", rank + 1, entry.name, entry.score);
    }
    Ok(())
}

fn inspect(config: ArcadeConfig, image_path: PathBuf, mask_out: Option<PathBuf>) -> Result<()> {
    let frame = ImageReader::open(&image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?
        .to_rgb8();
    info!(width = frame.width(), height = frame.height(), "Image loaded");

    let camera = Resolution::new(frame.width(), frame.height());
    let pipeline = TrackingPipeline::new(&config, camera);
    let (mask, blobs) = pipeline.detect(&frame, None);

    println!("\n=== Bright Spot Detection Results ===");
    println!("Sensitivity: {}", pipeline.segmenter.sensitivity());
    println!("Total blobs: {}", blobs.len());
    for (i, blob) in blobs.iter().enumerate() {
        let screen = pipeline.mapper.map(&blob.centroid);
        println!(
            "  Blob {} at ({:.1}, {:.1}) area {} -> screen ({}, {})",
            i + 1,
            blob.centroid.x,
            blob.centroid.y,
            blob.area,
            screen.x,
            screen.y
        );
    }

    if let Some(path) = mask_out {
        mask.save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save mask: {}", e))?;
        println!("Mask saved to {}", path.display());
    }
    Ok(())
}
