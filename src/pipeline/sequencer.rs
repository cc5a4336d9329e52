//! Frame sequencing: audio slicing, smoothing, and parallel rendering.
//!
//! Amplitude extraction and smoothing run in strict index order on the
//! coordinating thread; only frame rendering fans out to the worker
//! pool. Frame order therefore never depends on worker completion
//! order.

use std::sync::atomic::{AtomicUsize, Ordering};

use image::RgbaImage;
use rayon::prelude::*;
use thiserror::Error;

use super::ProgressReporter;
use crate::audio::{bar_amplitudes, AudioTrack};
use crate::frames::{FrameStore, FrameStoreError};
use crate::render::{render_frame, StyleConfig};

/// Progress range reserved for frame generation.
const PROGRESS_START: usize = 5;
const PROGRESS_SPAN: usize = 70;

/// Report progress roughly every this many completed frames.
const PROGRESS_STRIDE: usize = 10;

/// Errors raised while producing the frame sequence.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("Audio too short to produce a single frame at {fps} fps")]
    AudioTooShort { fps: u32 },

    #[error(transparent)]
    FrameStore(#[from] FrameStoreError),

    #[error("Failed to build render worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// One frame's audio sample sub-range.
#[derive(Debug, Clone, Copy)]
pub struct FrameSlice<'a> {
    pub index: usize,
    pub start_time: f64,
    pub samples: &'a [f32],
}

/// Number of video frames for a given audio duration and frame rate.
pub fn frame_count(duration_seconds: f64, fps: u32) -> usize {
    (duration_seconds * fps as f64).floor() as usize
}

/// Partition mono samples into `count` contiguous, non-overlapping
/// frame slices.
///
/// Segment length is the floor of an even split; trailing samples
/// shorter than one segment are dropped.
pub fn slice_frames(samples: &[f32], count: usize, sample_rate: u32) -> Vec<FrameSlice<'_>> {
    if count == 0 {
        return Vec::new();
    }
    let segment = samples.len() / count;
    (0..count)
        .map(|index| {
            let start = index * segment;
            let end = (start + segment).min(samples.len());
            FrameSlice {
                index,
                start_time: start as f64 / sample_rate.max(1) as f64,
                samples: &samples[start..end],
            }
        })
        .collect()
}

/// Blend each frame's amplitude vector with its predecessor's final
/// (post-smoothing) vector, in place and in index order.
///
/// Frame 0 keeps its raw vector. With `smoothing` = 0 every vector is
/// untouched.
pub fn smooth_sequence(frames: &mut [Vec<f32>], smoothing: f32) {
    if smoothing <= 0.0 {
        return;
    }
    for i in 1..frames.len() {
        let (done, rest) = frames.split_at_mut(i);
        let prev = &done[i - 1];
        for (current, &previous) in rest[0].iter_mut().zip(prev.iter()) {
            *current = previous * smoothing + *current * (1.0 - smoothing);
        }
    }
}

/// Produce and persist the full frame sequence for one run.
///
/// Returns the number of frames written. On any per-frame failure the
/// error propagates immediately; the caller purges the store.
pub fn generate_frames(
    track: &AudioTrack,
    background: &RgbaImage,
    style: &StyleConfig,
    fps: u32,
    workers: usize,
    store: &FrameStore,
    progress: &ProgressReporter,
) -> Result<usize, SequenceError> {
    let count = frame_count(track.duration(), fps);
    if count == 0 {
        return Err(SequenceError::AudioTooShort { fps });
    }

    let mono = track.to_mono();
    let slices = slice_frames(&mono, count, track.sample_rate);
    log::info!(
        "generating {} frames ({} samples per slice)",
        count,
        slices.first().map_or(0, |s| s.samples.len())
    );

    // Sequential pass: per-slice amplitudes, then the frame-to-frame blend.
    let mut amplitudes: Vec<Vec<f32>> = slices
        .iter()
        .map(|slice| bar_amplitudes(slice.samples, style.bar_count as usize, style.responsiveness))
        .collect();
    smooth_sequence(&mut amplitudes, style.smoothing);

    // Parallel pass: rendering and persistence, disjoint indices only.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()?;
    let completed = AtomicUsize::new(0);

    pool.install(|| {
        amplitudes
            .par_iter()
            .enumerate()
            .try_for_each(|(index, amps)| {
                let frame = render_frame(background, amps, style);
                store.write_frame(index, &frame)?;

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_STRIDE == 0 || done == count {
                    progress.report((PROGRESS_START + PROGRESS_SPAN * done / count) as u8);
                }
                Ok::<(), FrameStoreError>(())
            })
    })?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_floors() {
        assert_eq!(frame_count(5.0, 30), 150);
        assert_eq!(frame_count(5.03, 30), 150);
        assert_eq!(frame_count(0.99, 30), 29);
        assert_eq!(frame_count(0.01, 30), 0);
    }

    #[test]
    fn test_slices_are_contiguous_and_disjoint() {
        let samples = vec![0.0f32; 1003];
        let slices = slice_frames(&samples, 10, 1000);

        assert_eq!(slices.len(), 10);
        let segment = 1003 / 10;
        for (i, slice) in slices.iter().enumerate() {
            assert_eq!(slice.index, i);
            assert_eq!(slice.samples.len(), segment);
            assert!((slice.start_time - (i * segment) as f64 / 1000.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_more_frames_than_samples() {
        let samples = vec![0.0f32; 3];
        let slices = slice_frames(&samples, 10, 1000);
        assert_eq!(slices.len(), 10);
        // Zero-length segments still produce a renderable (silent) slice.
        assert!(slices.iter().all(|s| s.samples.is_empty()));
    }

    #[test]
    fn test_smoothing_zero_is_identity() {
        let raw = vec![vec![0.2, 0.8], vec![0.6, 0.4], vec![1.0, 0.0]];
        let mut frames = raw.clone();
        smooth_sequence(&mut frames, 0.0);
        assert_eq!(frames, raw);
    }

    #[test]
    fn test_smoothing_blends_against_previous_output() {
        let mut frames = vec![vec![1.0], vec![0.0], vec![0.0]];
        smooth_sequence(&mut frames, 0.5);

        assert_eq!(frames[0], vec![1.0]); // frame 0 untouched
        assert!((frames[1][0] - 0.5).abs() < 1e-6); // 1.0*0.5 + 0.0*0.5
        assert!((frames[2][0] - 0.25).abs() < 1e-6); // blends the *smoothed* 0.5
    }

    #[test]
    fn test_high_smoothing_converges_to_predecessor() {
        let mut frames = vec![vec![1.0], vec![0.0]];
        smooth_sequence(&mut frames, 0.99);
        assert!((frames[1][0] - 0.99).abs() < 1e-6);
    }
}
