//! Video muxing via an external FFmpeg subprocess.
//!
//! FFmpeg on the host is a deployment precondition; the core never
//! substitutes for it. The binary name is configurable so tests can
//! point at a stub.

use std::ffi::OsString;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::process::Command;

use thiserror::Error;

use super::hwaccel::HwAccel;
use crate::frames::{FrameStore, FrameStoreError};
use crate::render::even_dimensions;

/// Errors that can occur during video encoding.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Failed to launch video encoder '{program}': {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    #[error("Video encoder exited with {status}: {stderr}")]
    EncoderFailed { status: String, stderr: String },

    #[error("Encoder reported success but output file is missing: {0}")]
    OutputMissing(std::path::PathBuf),

    #[error("Output file exists but cannot be read: {0}")]
    OutputUnreadable(std::io::Error),

    #[error(transparent)]
    FrameStore(#[from] FrameStoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encoder settings for one run.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Frame rate of the image sequence and the output video.
    pub fps: u32,
    /// Encoder binary to invoke.
    pub program: String,
    /// AAC audio bitrate.
    pub audio_bitrate: String,
    /// Hardware acceleration path, from [`HwAccel::detect`] or forced.
    pub hwaccel: HwAccel,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            program: "ffmpeg".to_string(),
            audio_bitrate: "192k".to_string(),
            hwaccel: HwAccel::None,
        }
    }
}

/// Muxes an ordered frame set and the original audio into an MP4.
pub struct VideoEncoder {
    config: EncoderConfig,
}

impl VideoEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Encode the frame store's sequence plus the audio track into
    /// `output_path`.
    ///
    /// The first frame's dimensions are re-verified before muxing; if
    /// the render canvas drifted to odd dimensions, every stored frame
    /// is resized first, since the codec would otherwise reject the
    /// stream. The shorter of the two input streams truncates the
    /// output.
    pub fn encode(
        &self,
        store: &FrameStore,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<(), VideoError> {
        let (width, height) = store.first_frame_dimensions()?;
        let (even_w, even_h) = even_dimensions(width, height);
        if (even_w, even_h) != (width, height) {
            log::info!(
                "frame dimensions {}x{} are odd, renormalizing {} frames to {}x{}",
                width,
                height,
                store.frame_count(),
                even_w,
                even_h
            );
            store.renormalize_all(even_w, even_h)?;
        }

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let args = self.build_args(store, audio_path, output_path);
        log::info!(
            "running {} {}",
            self.config.program,
            args.iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(&self.config.program)
            .args(&args)
            .output()
            .map_err(|source| VideoError::Launch {
                program: self.config.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(VideoError::EncoderFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        // A zero exit is not proof the container landed on disk.
        if !output_path.exists() {
            return Err(VideoError::OutputMissing(output_path.to_path_buf()));
        }
        let mut probe = [0u8; 1024];
        File::open(output_path)
            .and_then(|mut f| f.read(&mut probe))
            .map_err(VideoError::OutputUnreadable)?;

        log::info!("video created at {}", output_path.display());
        Ok(())
    }

    /// Full encoder argument list for one run.
    fn build_args(&self, store: &FrameStore, audio_path: &Path, output_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        args.push("-y".into());
        args.push("-framerate".into());
        args.push(self.config.fps.to_string().into());
        args.push("-i".into());
        args.push(store.pattern().into());
        args.push("-i".into());
        args.push(audio_path.into());

        args.push("-c:v".into());
        args.push(self.config.hwaccel.video_codec().into());
        match self.config.hwaccel {
            HwAccel::None => {
                for a in ["-preset", "medium", "-profile:v", "main", "-pix_fmt", "yuv420p"] {
                    args.push(a.into());
                }
            }
            HwAccel::Nvidia => {
                for a in ["-preset", "medium", "-pix_fmt", "yuv420p"] {
                    args.push(a.into());
                }
            }
            HwAccel::Vaapi => {
                for a in self.config.hwaccel.filter_args() {
                    args.push((*a).into());
                }
            }
        }

        args.push("-c:a".into());
        args.push("aac".into());
        args.push("-b:a".into());
        args.push(self.config.audio_bitrate.clone().into());
        args.push("-shortest".into());
        args.push(output_path.into());
        args
    }
}
