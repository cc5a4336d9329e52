//! Per-run frame store.
//!
//! Rendered frames live in a scoped temporary arena between rendering
//! and encoding. Each pipeline run owns its own arena; concurrent
//! render workers write disjoint indices, and the encoder reads the
//! set only after all writers have joined. The arena is released on
//! every exit path: explicitly via [`FrameStore::purge`], or by the
//! temp directory guard when the run unwinds.

use std::fs;
use std::path::{Path, PathBuf};

use image::{imageops::FilterType, RgbaImage};
use tempfile::TempDir;
use thiserror::Error;

/// Errors raised by frame store operations.
#[derive(Debug, Error)]
pub enum FrameStoreError {
    #[error("Failed to create frame store: {0}")]
    Create(std::io::Error),

    #[error("Frame store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read or write frame image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Frame store contains no frames")]
    Empty,
}

/// Transient holding area for rendered frames, keyed by frame index.
pub struct FrameStore {
    dir: TempDir,
}

impl FrameStore {
    /// Create a fresh, empty arena in the system temp directory.
    pub fn new() -> Result<Self, FrameStoreError> {
        let dir = tempfile::Builder::new()
            .prefix("wavebar-frames-")
            .tempdir()
            .map_err(FrameStoreError::Create)?;
        log::debug!("frame store at {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Directory holding the frame files.
    pub fn dir_path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the frame with the given index.
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.path().join(format!("frame_{index:06}.png"))
    }

    /// printf-style pattern covering every frame, for the encoder.
    pub fn pattern(&self) -> PathBuf {
        self.dir.path().join("frame_%06d.png")
    }

    /// Persist one rendered frame under its index.
    ///
    /// Indices are written at most once per run, so concurrent callers
    /// on distinct indices never contend.
    pub fn write_frame(&self, index: usize, frame: &RgbaImage) -> Result<(), FrameStoreError> {
        frame.save(self.frame_path(index))?;
        Ok(())
    }

    /// Number of frames currently stored.
    pub fn frame_count(&self) -> usize {
        fs::read_dir(self.dir.path())
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0)
    }

    /// Pixel dimensions of frame 0.
    ///
    /// Reads only the image header. Fails with [`FrameStoreError::Empty`]
    /// when no frame has been written.
    pub fn first_frame_dimensions(&self) -> Result<(u32, u32), FrameStoreError> {
        let first = self.frame_path(0);
        if !first.exists() {
            return Err(FrameStoreError::Empty);
        }
        Ok(image::image_dimensions(&first)?)
    }

    /// Resize every stored frame to the given dimensions in place.
    ///
    /// Used when the rendered canvas drifted off the even dimensions
    /// the encoder requires.
    pub fn renormalize_all(&self, width: u32, height: u32) -> Result<(), FrameStoreError> {
        for entry in fs::read_dir(self.dir.path())? {
            let path = entry?.path();
            let frame = image::open(&path)?.to_rgba8();
            if frame.dimensions() != (width, height) {
                let resized = image::imageops::resize(&frame, width, height, FilterType::Triangle);
                resized.save(&path)?;
            }
        }
        Ok(())
    }

    /// Delete the arena and everything in it.
    ///
    /// Cleanup failure is logged and swallowed; it must never mask the
    /// run's primary result.
    pub fn purge(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            log::warn!("failed to remove frame store {}: {}", path.display(), e);
        }
    }
}
