//! End-to-end pipeline: audio in, MP4 out.
//!
//! [`render_visualization`] is the boundary callers (a web layer, the
//! CLI) invoke with a fixed parameter set; everything else in the
//! crate hangs off it.

pub mod sequencer;

use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

use crate::audio::{load_audio, AudioError};
use crate::frames::{FrameStore, FrameStoreError};
use crate::render::{load_background, BackgroundError, StyleConfig, StyleError};
use crate::video::{EncoderConfig, HwAccel, VideoEncoder, VideoError};
use self::sequencer::SequenceError;

/// Optional observer for percentage progress, 0..=100.
///
/// Invoked from whichever thread completes work; implementations must
/// be thread-safe and must not block.
pub type ProgressCallback = Box<dyn Fn(u8) + Send + Sync>;

/// Serializes progress delivery and keeps it monotonic non-decreasing.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    last: Mutex<u8>,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            last: Mutex::new(0),
        }
    }

    /// Report `percent` if it advances the run; stale or duplicate
    /// values are dropped. Never fails the run.
    pub fn report(&self, percent: u8) {
        let Some(callback) = &self.callback else {
            return;
        };
        let percent = percent.min(100);
        let Ok(mut last) = self.last.lock() else {
            return;
        };
        if percent > *last {
            *last = percent;
            callback(percent);
        }
    }
}

/// Everything a caller supplies for one run.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub audio_path: PathBuf,
    pub image_path: PathBuf,
    pub output_path: PathBuf,
    pub style: StyleConfig,
    /// Output frame rate.
    pub fps: u32,
    /// Render worker pool size.
    pub workers: usize,
    /// Encoder binary; tests substitute a stub.
    pub encoder_program: String,
    /// Hardware acceleration override; `None` probes the host.
    pub hwaccel: Option<HwAccel>,
}

impl RenderRequest {
    pub fn new(
        audio_path: impl Into<PathBuf>,
        image_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            audio_path: audio_path.into(),
            image_path: image_path.into(),
            output_path: output_path.into(),
            style: StyleConfig::default(),
            fps: 30,
            workers: 4,
            encoder_program: "ffmpeg".to_string(),
            hwaccel: None,
        }
    }
}

/// Terminal outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub output_path: PathBuf,
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
}

/// Where in the pipeline an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    /// Unusable caller input; no work was begun.
    Input,
    /// Frame production failed mid-run.
    Render,
    /// The external encoder failed or its output is unusable.
    Encode,
}

/// Errors surfaced to pipeline callers.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Style(#[from] StyleError),

    #[error("Frame rate must be at least 1, got {0}")]
    InvalidFps(u32),

    #[error("Audio input error: {0}")]
    Audio(#[from] AudioError),

    #[error("Image input error: {0}")]
    Background(#[from] BackgroundError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    FrameStore(#[from] FrameStoreError),

    #[error("Video encoding failed: {0}")]
    Video(#[from] VideoError),
}

impl PipelineError {
    /// Coarse classification for callers that map failures to user
    /// messages.
    pub fn stage(&self) -> ErrorStage {
        match self {
            PipelineError::Style(_)
            | PipelineError::InvalidFps(_)
            | PipelineError::Audio(_)
            | PipelineError::Background(_)
            | PipelineError::Sequence(SequenceError::AudioTooShort { .. }) => ErrorStage::Input,
            PipelineError::Sequence(_) | PipelineError::FrameStore(_) => ErrorStage::Render,
            PipelineError::Video(_) => ErrorStage::Encode,
        }
    }
}

/// Run the full pipeline: normalize the image, slice and analyze the
/// audio, render all frames, and mux the result.
///
/// Inputs are validated before any frame-store state exists, so input
/// failures leave nothing behind. The frame store is purged on every
/// path once created. The core never retries; retry policy belongs to
/// the caller.
pub fn render_visualization(
    request: &RenderRequest,
    progress: Option<ProgressCallback>,
) -> Result<PipelineResult, PipelineError> {
    request.style.validate()?;
    if request.fps == 0 {
        return Err(PipelineError::InvalidFps(0));
    }
    let progress = ProgressReporter::new(progress);

    log::info!(
        "rendering {} + {} -> {}",
        request.audio_path.display(),
        request.image_path.display(),
        request.output_path.display()
    );

    let track = load_audio(&request.audio_path)?;
    let background = load_background(&request.image_path)?;
    let (width, height) = background.dimensions();
    progress.report(5);

    let store = FrameStore::new()?;
    let outcome = run_stages(request, &track, &background, &store, &progress);
    // Cleanup is unconditional: success and failure both release the arena.
    store.purge();
    let frame_count = outcome?;

    progress.report(100);
    Ok(PipelineResult {
        output_path: request.output_path.clone(),
        frame_count,
        width,
        height,
    })
}

fn run_stages(
    request: &RenderRequest,
    track: &crate::audio::AudioTrack,
    background: &image::RgbaImage,
    store: &FrameStore,
    progress: &ProgressReporter,
) -> Result<usize, PipelineError> {
    let frame_count = sequencer::generate_frames(
        track,
        background,
        &request.style,
        request.fps,
        request.workers,
        store,
        progress,
    )?;
    progress.report(85);

    let encoder = VideoEncoder::new(EncoderConfig {
        fps: request.fps,
        program: request.encoder_program.clone(),
        hwaccel: request.hwaccel.unwrap_or_else(HwAccel::detect),
        ..EncoderConfig::default()
    });
    encoder.encode(store, &request.audio_path, &request.output_path)?;

    Ok(frame_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU8, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_progress_reporter_is_monotonic() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::new(Some(Box::new(move |p| {
            sink.lock().unwrap().push(p);
        })));

        for p in [5, 40, 20, 40, 85, 100, 90] {
            reporter.report(p);
        }
        assert_eq!(*seen.lock().unwrap(), vec![5, 40, 85, 100]);
    }

    #[test]
    fn test_progress_reporter_clamps_to_100() {
        let last = Arc::new(AtomicU8::new(0));
        let sink = last.clone();
        let reporter = ProgressReporter::new(Some(Box::new(move |p| {
            sink.store(p, Ordering::Relaxed);
        })));
        reporter.report(200);
        assert_eq!(last.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn test_unobserved_progress_is_free() {
        let reporter = ProgressReporter::new(None);
        reporter.report(50); // must not panic or block
    }

    #[test]
    fn test_invalid_style_is_input_stage() {
        let mut request = RenderRequest::new("a.wav", "b.png", "c.mp4");
        request.style.bar_count = 0;
        let err = render_visualization(&request, None).unwrap_err();
        assert_eq!(err.stage(), ErrorStage::Input);
    }

    #[test]
    fn test_zero_fps_rejected() {
        let mut request = RenderRequest::new("a.wav", "b.png", "c.mp4");
        request.fps = 0;
        let err = render_visualization(&request, None).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFps(0)));
    }
}
