//! Per-frame bar amplitude extraction.
//!
//! Turns one frame's worth of audio samples into a fixed-length vector
//! of normalized bar heights: short-time FFT, decibel conversion
//! referenced to the slice's own peak, low-bin averaging, min-max
//! normalization, and linear resampling to the requested bar count.

use super::fft::SpectrumAnalyzer;

/// Upper bound on the short-time FFT window.
pub const MAX_FFT_SIZE: usize = 2048;

/// Only the lowest bins feed the bars; higher bins carry little
/// visible energy for typical music.
pub const LOW_BIN_LIMIT: usize = 128;

/// Decibel floor; matches the dynamic range players actually show.
const DB_FLOOR: f32 = -80.0;

/// Compute normalized bar amplitudes for one audio slice.
///
/// Returns exactly `bar_count` values in `0.0..=1.0`. The result is a
/// pure function of the inputs: no state is carried between calls.
/// Degenerate input (an empty, too-short, or perfectly flat slice)
/// yields an all-zero vector rather than NaN or infinity.
pub fn bar_amplitudes(samples: &[f32], bar_count: usize, responsiveness: f32) -> Vec<f32> {
    if bar_count == 0 {
        return Vec::new();
    }

    let Some(fft_size) = stft_window_len(samples.len()) else {
        return vec![0.0; bar_count];
    };

    let columns = stft_magnitudes(samples, fft_size);

    // Reference level is the loudest component of this slice, so every
    // frame self-normalizes against its own peak.
    let peak = columns
        .iter()
        .flat_map(|col| col.iter().copied())
        .fold(0.0f32, f32::max);
    if peak <= 0.0 {
        return vec![0.0; bar_count];
    }

    // Average dB energy per bin across the slice's time steps.
    let num_bins = LOW_BIN_LIMIT.min(fft_size / 2);
    let mut averaged = vec![0.0f32; num_bins];
    for column in &columns {
        for (avg, &mag) in averaged.iter_mut().zip(column.iter()) {
            *avg += (20.0 * (mag / peak).max(1e-10).log10()).max(DB_FLOOR);
        }
    }
    for avg in &mut averaged {
        *avg = *avg / columns.len() as f32 * responsiveness;
    }

    let normalized = min_max_normalize(&averaged);
    resample_linear(&normalized, bar_count)
}

/// Short-time magnitude spectrum of a whole slice.
///
/// Hop length is a quarter window; at least one column is produced for
/// any slice at least one window long.
fn stft_magnitudes(samples: &[f32], fft_size: usize) -> Vec<Vec<f32>> {
    let hop = (fft_size / 4).max(1);
    let mut analyzer = SpectrumAnalyzer::new(fft_size);

    let mut columns = Vec::new();
    let mut start = 0;
    while start + fft_size <= samples.len() {
        columns.push(analyzer.analyze(&samples[start..start + fft_size]));
        start += hop;
    }
    columns
}

/// Largest power-of-two window that fits the slice, capped at
/// [`MAX_FFT_SIZE`]. `None` when the slice is too short to analyze.
fn stft_window_len(slice_len: usize) -> Option<usize> {
    let capped = slice_len.min(MAX_FFT_SIZE);
    if capped < 2 {
        return None;
    }
    let window = if capped.is_power_of_two() {
        capped
    } else {
        capped.next_power_of_two() / 2
    };
    (window >= 2).then_some(window)
}

/// Min-max normalize to `0.0..=1.0`.
///
/// A flat input (max == min, e.g. silence) would divide by zero, so it
/// collapses to all zeros instead.
fn min_max_normalize(values: &[f32]) -> Vec<f32> {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let span = max - min;
    if !span.is_finite() || span <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|&v| (v - min) / span).collect()
}

/// Linearly resample a vector to exactly `target` elements.
fn resample_linear(values: &[f32], target: usize) -> Vec<f32> {
    if values.is_empty() {
        return vec![0.0; target];
    }
    if target == 1 || values.len() == 1 {
        return vec![values[0]; target];
    }

    let step = (values.len() - 1) as f32 / (target - 1) as f32;
    (0..target)
        .map(|i| {
            let pos = i as f32 * step;
            let idx = pos.floor() as usize;
            let frac = pos - idx as f32;
            if idx + 1 < values.len() {
                values[idx] * (1.0 - frac) + values[idx + 1] * frac
            } else {
                values[idx]
            }
        })
        .collect()
}
