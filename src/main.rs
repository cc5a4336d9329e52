//! Command-line front end for the visualization pipeline.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use wavebar_visualizer::pipeline::{render_visualization, RenderRequest};
use wavebar_visualizer::render::{parse_hex_color, BarAnchor, StyleConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render an audio-reactive bar visualization video", long_about = None)]
struct Cli {
    /// Audio file to visualize (WAV primary; MP3, FLAC, AAC accepted).
    audio: PathBuf,

    /// Background image (JPEG, PNG).
    image: PathBuf,

    /// Output MP4 path.
    output: PathBuf,

    /// Output frame rate.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Style preset as a JSON file; the flags below override its fields.
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Bar color as a hex string, e.g. "#00ffff".
    #[arg(long)]
    color: Option<String>,

    /// Number of bars.
    #[arg(long)]
    bars: Option<u32>,

    /// Draw a soft glow beneath each bar.
    #[arg(long)]
    glow: bool,

    /// Frame-to-frame smoothing factor; 0 disables blending.
    #[arg(long)]
    smoothing: Option<f32>,

    /// Grow bars away from the anchor line instead of centering on it.
    #[arg(long)]
    directional: bool,

    /// Render worker pool size.
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Encoder binary to invoke.
    #[arg(long, default_value = "ffmpeg")]
    encoder: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut style = match &cli.preset {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading preset {}", path.display()))?;
            serde_json::from_str::<StyleConfig>(&json)
                .with_context(|| format!("parsing preset {}", path.display()))?
        }
        None => StyleConfig::default(),
    };

    if let Some(hex) = &cli.color {
        style.color = parse_hex_color(hex).with_context(|| format!("invalid color {hex:?}"))?;
    }
    if let Some(bars) = cli.bars {
        style.bar_count = bars;
    }
    if cli.glow {
        style.glow_enabled = true;
    }
    if let Some(smoothing) = cli.smoothing {
        style.smoothing = smoothing;
    }
    if cli.directional {
        style.anchor = BarAnchor::Directional;
    }

    let mut request = RenderRequest::new(&cli.audio, &cli.image, &cli.output);
    request.style = style;
    request.fps = cli.fps;
    request.workers = cli.workers;
    request.encoder_program = cli.encoder.clone();

    let result = render_visualization(
        &request,
        Some(Box::new(|percent| {
            log::info!("progress: {percent}%");
        })),
    )?;

    println!(
        "wrote {} ({} frames at {}x{})",
        result.output_path.display(),
        result.frame_count,
        result.width,
        result.height
    );
    Ok(())
}
