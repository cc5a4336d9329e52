//! FFT magnitude analysis using RustFFT.

use rustfft::{num_complex::Complex, FftPlanner};

/// Windowed FFT front-end for short-time spectral analysis.
///
/// Converts time-domain audio samples to a frequency-domain magnitude
/// spectrum. One instance is reused across the hops of a slice.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f32>,
    fft_size: usize,
    window: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Create a new analyzer with the given FFT size.
    ///
    /// Larger sizes give better frequency resolution but worse time
    /// resolution.
    ///
    /// # Panics
    ///
    /// Panics if `fft_size` is not a power of 2.
    pub fn new(fft_size: usize) -> Self {
        assert!(fft_size.is_power_of_two(), "FFT size must be a power of 2");

        // Hann window to reduce spectral leakage
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let t = i as f32 / (fft_size - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        Self {
            planner: FftPlanner::new(),
            fft_size,
            window,
        }
    }

    /// FFT size being used.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins in the output (FFT size / 2).
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2
    }

    /// Compute the magnitude spectrum of one window of samples.
    ///
    /// Returns magnitudes for frequencies from 0 to Nyquist; the
    /// returned vector has length `fft_size / 2`.
    ///
    /// # Panics
    ///
    /// Panics if `samples.len() < fft_size`.
    pub fn analyze(&mut self, samples: &[f32]) -> Vec<f32> {
        assert!(
            samples.len() >= self.fft_size,
            "Not enough samples: need {} but got {}",
            self.fft_size,
            samples.len()
        );

        let mut buffer: Vec<Complex<f32>> = samples[..self.fft_size]
            .iter()
            .zip(&self.window)
            .map(|(s, w)| Complex::new(s * w, 0.0))
            .collect();

        let fft = self.planner.plan_fft_forward(self.fft_size);
        fft.process(&mut buffer);

        buffer[..self.fft_size / 2]
            .iter()
            .map(|c| c.norm() / (self.fft_size as f32).sqrt())
            .collect()
    }

    /// Get the frequency in Hz for a given bin index.
    pub fn bin_to_freq(&self, bin: usize, sample_rate: u32) -> f32 {
        bin as f32 * sample_rate as f32 / self.fft_size as f32
    }
}
