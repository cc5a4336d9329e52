//! Hardware encoder detection.
//!
//! Probes for vendor tooling to pick a hardware H.264 encoder. Every
//! probe is best-effort: any failure, including the probe binary being
//! absent, resolves to the software path. Detection can never abort a
//! run.

use std::process::{Command, Stdio};

/// Available hardware acceleration paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HwAccel {
    /// Software encoding via libx264.
    #[default]
    None,
    /// NVIDIA NVENC.
    Nvidia,
    /// VA-API (Intel/AMD on Linux).
    Vaapi,
}

impl HwAccel {
    /// Probe the host for a usable hardware encoder.
    pub fn detect() -> Self {
        if probe("nvidia-smi", &["-L"]) {
            log::info!("NVIDIA GPU detected, using h264_nvenc");
            return HwAccel::Nvidia;
        }
        if probe("vainfo", &[]) {
            log::info!("VA-API device detected, using h264_vaapi");
            return HwAccel::Vaapi;
        }
        log::debug!("no hardware encoder detected, using libx264");
        HwAccel::None
    }

    /// FFmpeg video codec name for this path.
    pub fn video_codec(&self) -> &'static str {
        match self {
            HwAccel::None => "libx264",
            HwAccel::Nvidia => "h264_nvenc",
            HwAccel::Vaapi => "h264_vaapi",
        }
    }

    /// Extra FFmpeg arguments required before the output options.
    ///
    /// VA-API needs the device opened and frames uploaded to it.
    pub fn filter_args(&self) -> &'static [&'static str] {
        match self {
            HwAccel::Vaapi => &[
                "-vaapi_device",
                "/dev/dri/renderD128",
                "-vf",
                "format=nv12,hwupload",
            ],
            _ => &[],
        }
    }
}

fn probe(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
