//! Audio loading and spectral analysis.
//!
//! This module provides:
//! - Audio file loading via Symphonia (WAV primary; MP3, FLAC, AAC)
//! - Windowed FFT magnitude analysis via RustFFT
//! - Per-frame bar amplitude extraction for the renderer
//! - Synthetic test-signal generation

pub mod fft;
pub mod loader;
pub mod spectrum;
pub mod synth;

pub use fft::SpectrumAnalyzer;
pub use loader::{load_audio, AudioError, AudioTrack};
pub use spectrum::{bar_amplitudes, LOW_BIN_LIMIT, MAX_FFT_SIZE};
pub use synth::{generate_click_track, generate_sine, generate_white_noise, write_wav};
