//! Audio file loading using Symphonia.
//!
//! WAV is the primary input format; anything else Symphonia can probe
//! (MP3, FLAC, AAC) decodes through the same path.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use thiserror::Error;

/// Errors that can occur while loading an audio track.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to open audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode audio: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("No audio track found in file")]
    NoAudioTrack,

    #[error("Unknown sample rate")]
    UnknownSampleRate,

    #[error("Audio stream contains no samples")]
    EmptyStream,
}

/// A fully decoded audio track.
///
/// Loaded once per pipeline run and never mutated afterwards. The
/// sample rate is whatever the file carries; no resampling happens.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    /// Interleaved samples (f32, normalized to -1.0..1.0)
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: usize,
}

impl AudioTrack {
    /// Duration of the track in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Downmix to mono by averaging channels.
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks(self.channels)
            .map(|frame| frame.iter().sum::<f32>() / self.channels as f32)
            .collect()
    }
}

/// Load and fully decode an audio track from a file path.
///
/// # Example
///
/// ```no_run
/// use wavebar_visualizer::audio::load_audio;
/// use std::path::Path;
///
/// let track = load_audio(Path::new("song.wav")).unwrap();
/// println!("{:.2}s at {}Hz", track.duration(), track.sample_rate);
/// ```
pub fn load_audio(path: &Path) -> Result<AudioTrack, AudioError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::NoAudioTrack)?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(AudioError::UnknownSampleRate)?;
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);

    let decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let samples = decode_all(format.as_mut(), decoder, track_id)?;
    if samples.is_empty() {
        return Err(AudioError::EmptyStream);
    }

    log::debug!(
        "loaded {} samples, {} channel(s) at {} Hz",
        samples.len(),
        channels,
        sample_rate
    );

    Ok(AudioTrack {
        samples,
        sample_rate,
        channels,
    })
}

/// Drain every packet of the selected track into an interleaved f32 buffer.
fn decode_all(
    format: &mut dyn FormatReader,
    mut decoder: Box<dyn Decoder>,
    track_id: u32,
) -> Result<Vec<f32>, AudioError> {
    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(symphonia::core::errors::Error::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // Corrupt packets are skipped; the remainder still decodes
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            let capacity = decoded.capacity() as u64;
            sample_buf = Some(SampleBuffer::new(capacity, spec));
        }

        if let Some(buf) = &mut sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_duration() {
        let track = AudioTrack {
            samples: vec![0.0; 44100 * 2], // 1 second of stereo
            sample_rate: 44100,
            channels: 2,
        };
        assert!((track.duration() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_track_to_mono() {
        let track = AudioTrack {
            samples: vec![0.5, -0.5, 1.0, 0.0], // 2 stereo frames
            sample_rate: 44100,
            channels: 2,
        };
        let mono = track.to_mono();
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.0).abs() < 0.001);
        assert!((mono[1] - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_mono_passthrough() {
        let track = AudioTrack {
            samples: vec![0.1, 0.2, 0.3],
            sample_rate: 8000,
            channels: 1,
        };
        assert_eq!(track.to_mono(), track.samples);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_audio(Path::new("/nonexistent/missing.wav")).unwrap_err();
        assert!(matches!(err, AudioError::Io(_)));
    }
}
