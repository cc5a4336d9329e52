//! Wavebar Visualizer
//!
//! Turns an audio file and a still image into an MP4 video whose frames
//! show an animated frequency-bar visualization overlaid on the image,
//! synchronized to the audio.
//!
//! # Features
//!
//! - Audio loading (WAV, MP3, FLAC, AAC) via Symphonia
//! - Short-time FFT spectrum analysis via RustFFT
//! - CPU bar rendering over a dimension-normalized background image
//! - Parallel frame generation with strictly ordered smoothing
//! - Video muxing via an external FFmpeg subprocess (H.264/AAC MP4)

pub mod audio;
pub mod frames;
pub mod pipeline;
pub mod render;
pub mod video;

// Re-export commonly used types
pub use audio::{bar_amplitudes, load_audio, AudioTrack, SpectrumAnalyzer};
pub use frames::FrameStore;
pub use pipeline::{
    render_visualization, ErrorStage, PipelineError, PipelineResult, ProgressCallback,
    RenderRequest,
};
pub use render::{parse_hex_color, render_frame, BarAnchor, StyleConfig};
pub use video::{EncoderConfig, HwAccel, VideoEncoder};
