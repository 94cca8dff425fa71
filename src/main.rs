//! fall-sentinel command-line entry point.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fall_sentinel::clock::{format_playback, progress_percent};
use fall_sentinel::demo;
use fall_sentinel::overlay::SkeletonOverlay;
use fall_sentinel::stats::TimelineState;
use fall_sentinel::{
    Config, JsonLinesSink, Monitor, PostureLabel, PostureStats, RecordedPoseEstimator, Recording,
};

#[derive(Parser)]
#[command(name = "fall-sentinel", version, about = "Posture and fall monitoring over pose recordings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a pose recording through the engine
    Run {
        /// JSON-lines recording, one `{"t": ms, "keypoints": [...] | null}` per line
        #[arg(long)]
        recording: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Simulated minutes per media second
        #[arg(long)]
        speed: Option<f64>,

        /// Simulated start date (YYYY-MM-DD)
        #[arg(long, requires = "start_time")]
        date: Option<String>,

        /// Simulated start time (HH:MM)
        #[arg(long, requires = "date")]
        start_time: Option<String>,

        /// Write events here instead of stdout
        #[arg(long)]
        events: Option<PathBuf>,

        /// Replay at the recording's own cadence
        #[arg(long)]
        pace: bool,

        #[arg(long, default_value_t = 30)]
        fps: u32,
    },
    /// Write the default configuration
    InitConfig { path: PathBuf },
    /// Print the canned analysis for a demo clip
    Demo {
        /// standing, sitting, laying or falling
        #[arg(long)]
        event: String,

        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            recording,
            config,
            speed,
            date,
            start_time,
            events,
            pace,
            fps,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(speed) = speed {
                config.clock.speed = Some(speed);
            }
            if let (Some(date), Some(start_time)) = (date, start_time) {
                config.clock = config.clock.with_start_parts(&date, &start_time)?;
            }
            config.validate()?;

            let to_file = events.is_some();
            let writer: Box<dyn Write> = match &events {
                Some(path) => Box::new(BufWriter::new(
                    File::create(path)
                        .with_context(|| format!("creating events file {}", path.display()))?,
                )),
                None => Box::new(io::stdout()),
            };

            let min_visibility = config.overlay.min_visibility;
            let clip_seconds = config.clock.video_duration_seconds;
            let mut source = Recording::open(&recording)?;
            let mut sink = (JsonLinesSink::new(writer), PostureStats::new());
            let mut monitor = Monitor::new(config, fps)?.with_pacing(pace);

            info!(recording = %recording.display(), "replaying recording");
            let summary = monitor.run_with(
                &mut source,
                &mut RecordedPoseEstimator,
                &mut sink,
                |outcome, keypoints| {
                    if !tracing::enabled!(Level::DEBUG) {
                        return;
                    }
                    let secs = outcome.timestamp_ms as f64 / 1_000.0;
                    if let Some(ks) = keypoints {
                        let overlay = SkeletonOverlay::build(ks, min_visibility, outcome.instantaneous);
                        debug!(
                            at = %format_playback(secs),
                            progress = ?clip_seconds.map(|d| progress_percent(secs, d)),
                            points = overlay.points.len(),
                            bones = overlay.bones.len(),
                            alert = overlay.alert,
                            "overlay"
                        );
                    }
                },
            )?;

            let (_, stats) = sink;
            let report = format!(
                "{stats}\n{}frames {} (no body {}, failed {}), worst frame {:?}, final posture {}",
                timeline_report(&stats),
                summary.metrics.total_frames,
                summary.metrics.frames_without_body,
                summary.metrics.failed_frames,
                summary.metrics.worst_case,
                summary.final_posture.unwrap_or(PostureLabel::Unknown),
            );
            if to_file {
                println!("{report}");
            } else {
                eprintln!("{report}");
            }
        }
        Commands::InitConfig { path } => {
            Config::default().save(&path)?;
            println!("wrote default configuration to {}", path.display());
        }
        Commands::Demo { event, config } => {
            let config = load_config(config.as_ref())?;
            let event: PostureLabel = event.parse()?;
            let analysis = demo::analyze(event, &config.clock.clock());
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
    }

    Ok(())
}

fn timeline_report(stats: &PostureStats) -> String {
    if stats.is_empty() {
        return "no posture sessions recorded\n".to_string();
    }

    let mut out = String::new();
    for day in stats.days() {
        out.push_str(&format!("{day}\n"));
        for segment in stats.timeline(day, None) {
            let state = match segment.state {
                TimelineState::Posture(posture) => posture.as_str(),
                TimelineState::Future => "future",
            };
            out.push_str(&format!(
                "  {:02}:{:02} {:>5}m {state}\n",
                segment.start_minute / 60,
                segment.start_minute % 60,
                segment.minutes
            ));
        }
    }
    out
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}
