/*!
 * In-memory PCM audio.
 *
 * Everything the pipeline produces is 16-bit integer PCM. WAV files are read
 * and written with `hound`; float and other integer widths are converted on
 * the way in.
 */

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::errors::{DubbingError, ProviderError};

/// Interleaved 16-bit PCM samples plus their format
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioBuffer {
    /// An empty buffer with the given format
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            samples: Vec::new(),
        }
    }

    /// `duration_ms` of digital silence in the given format
    pub fn silence(duration_ms: u64, sample_rate: u32, channels: u16) -> Self {
        let frames = (sample_rate as u64 * duration_ms / 1000) as usize;
        Self {
            sample_rate,
            channels,
            samples: vec![0; frames * channels as usize],
        }
    }

    /// Decode a WAV file
    pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let reader = WavReader::open(path)
            .map_err(|e| ProviderError::InvalidAudio(format!("{}: {}", path.display(), e)))?;
        Self::decode(reader)
    }

    /// Decode WAV bytes held in memory
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, ProviderError> {
        let reader = WavReader::new(Cursor::new(bytes))
            .map_err(|e| ProviderError::InvalidAudio(e.to_string()))?;
        Self::decode(reader)
    }

    fn decode<R: std::io::Read>(mut reader: WavReader<R>) -> Result<Self, ProviderError> {
        let spec = reader.spec();
        let invalid = |e: hound::Error| ProviderError::InvalidAudio(e.to_string());

        let samples: Vec<i16> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
                .collect::<Result<_, _>>()
                .map_err(invalid)?,
            SampleFormat::Int if spec.bits_per_sample == 16 => reader
                .samples::<i16>()
                .collect::<Result<_, _>>()
                .map_err(invalid)?,
            SampleFormat::Int => {
                let bits = spec.bits_per_sample as i32;
                reader
                    .samples::<i32>()
                    .map(|s| {
                        s.map(|v| {
                            if bits > 16 {
                                (v >> (bits - 16)) as i16
                            } else {
                                (v << (16 - bits)) as i16
                            }
                        })
                    })
                    .collect::<Result<_, _>>()
                    .map_err(invalid)?
            }
        };

        Ok(Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    fn spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    /// Encode as a 16-bit WAV file
    pub fn write_wav<P: AsRef<Path>>(&self, path: P) -> Result<(), DubbingError> {
        let mut writer = WavWriter::create(path.as_ref(), self.spec()).map_err(hound_error)?;
        for &sample in &self.samples {
            writer.write_sample(sample).map_err(hound_error)?;
        }
        writer.finalize().map_err(hound_error)
    }

    /// Same sample rate and channel layout
    pub fn is_compatible(&self, other: &AudioBuffer) -> bool {
        self.sample_rate == other.sample_rate && self.channels == other.channels
    }

    /// Append another buffer of the same format
    pub fn append(&mut self, other: &AudioBuffer) -> Result<(), ProviderError> {
        if !self.is_compatible(other) {
            return Err(ProviderError::InvalidAudio(format!(
                "format mismatch: {} Hz/{} ch vs {} Hz/{} ch",
                self.sample_rate, self.channels, other.sample_rate, other.channels
            )));
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frame_count() as f64 / self.sample_rate as f64
        }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            0
        } else {
            self.frame_count() as u64 * 1000 / self.sample_rate as u64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn hound_error(error: hound::Error) -> DubbingError {
    match error {
        hound::Error::IoError(e) => DubbingError::Io(e),
        other => DubbingError::InvalidInput(format!("WAV encoding failed: {}", other)),
    }
}
