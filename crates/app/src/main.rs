use std::path::PathBuf;

use beatsync_core::{Chart, MediaSource, ScriptedMedia, Session};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> beatsync_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output } => run_init(&output),
        Commands::Check { input } => run_check(&input),
        Commands::Preview {
            chart,
            fps,
            multiplier,
            force,
        } => run_preview(&chart, fps, multiplier, force),
    }
}

fn run_init(output: &PathBuf) -> beatsync_core::Result<()> {
    let chart = Chart::default();
    std::fs::write(output, chart.to_json()?)?;
    tracing::info!(?output, "wrote default chart");
    Ok(())
}

fn run_check(input: &PathBuf) -> beatsync_core::Result<()> {
    let text = std::fs::read_to_string(input)?;
    let chart = Chart::from_json(&text)?;
    tracing::info!(
        ?input,
        bpm = chart.bpm,
        sections = chart.sections.len(),
        notes = chart.notes.len(),
        effects = chart.effects.len(),
        duration = chart.duration(),
        "chart document is valid"
    );
    Ok(())
}

fn run_preview(
    chart_path: &PathBuf,
    fps: u32,
    multiplier: f64,
    force: Option<f64>,
) -> beatsync_core::Result<()> {
    let text = std::fs::read_to_string(chart_path)?;

    let mut session = Session::new();
    session.import_document(&text)?;
    session.set_preview_multiplier(multiplier);
    session.set_forced_rate(force);

    let duration = session.chart().duration();
    let mut media = ScriptedMedia::new(duration);
    session.load_media(MediaSource::new(format!("file://{}", chart_path.display())));
    session.media_ready(&media, None);

    tracing::info!(?chart_path, duration, fps, "starting headless preview");

    media.play();
    session.handle_play(&mut media);

    let step = 1.0 / f64::from(fps.max(1));
    let mut frames = 0_u64;
    let mut hits = 0_u64;
    while session.is_animating() {
        if let Some(frame) = session.tick(Some(&mut media), None) {
            frames += 1;
            if frame.target_hit {
                hits += 1;
                tracing::debug!(time = frame.time, "note on target");
            }
        }
        for effect in session.sample_effects(&media) {
            tracing::info!(
                kind = ?effect.kind,
                display_ms = effect.display_for.as_millis() as u64,
                "effect fired"
            );
        }
        media.advance(step);
    }

    session.teardown();
    tracing::info!(frames, hits, "preview finished");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Rhythm-chart editor and player", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a fresh default chart document.
    Init {
        /// Output path for the chart JSON.
        output: PathBuf,
    },
    /// Parse and validate a chart document.
    Check {
        /// Path to the chart JSON to validate.
        input: PathBuf,
    },
    /// Play a chart headlessly against a simulated clock, logging frames and
    /// fired effects.
    Preview {
        /// Path to the chart JSON to play.
        chart: PathBuf,
        /// Simulated display refresh rate.
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// Preview speed multiplier applied on top of the section rates.
        #[arg(short, long, default_value_t = 1.0)]
        multiplier: f64,
        /// Absolute playback-rate override bypassing the sections.
        #[arg(short, long)]
        force: Option<f64>,
    },
}
