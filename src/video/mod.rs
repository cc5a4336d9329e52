//! Video encoding via an external FFmpeg subprocess.
//!
//! This module provides:
//! - H.264/AAC MP4 muxing of the rendered frame sequence
//! - Best-effort hardware encoder detection with software fallback
//! - Even-dimension re-verification before muxing

pub mod encoder;
pub mod hwaccel;

pub use encoder::{EncoderConfig, VideoEncoder, VideoError};
pub use hwaccel::HwAccel;
