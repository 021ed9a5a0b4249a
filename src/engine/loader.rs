//! Track loading
//!
//! A `Loader` turns a `TrackSource` into a `DecodedAudioBuffer`. Loads may
//! block; the host decides where they run and hands the result back to the
//! controller together with the `LoadTicket` it was started with.

use std::io::{Cursor, Read};
use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::engine::buffer::DecodedAudioBuffer;
use crate::engine::track::{TrackGeneration, TrackSource};
use crate::error::LoadError;

/// Decodes track sources into playable buffers
pub trait Loader: Send + Sync {
    fn load(&self, source: &TrackSource) -> Result<DecodedAudioBuffer, LoadError>;
}

/// Receipt for a started load
///
/// The controller publishes a result only if the ticket's generation still
/// matches the current track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub(crate) generation: TrackGeneration,
    pub(crate) source: TrackSource,
}

impl LoadTicket {
    pub fn generation(&self) -> TrackGeneration {
        self.generation
    }

    pub fn source(&self) -> &TrackSource {
        &self.source
    }
}

// ============================================================================
// WAV loader
// ============================================================================

/// Loads WAV audio from paths, `file://` URLs or in-memory blobs
#[derive(Debug, Clone, Copy, Default)]
pub struct WavLoader;

impl WavLoader {
    pub fn new() -> Self {
        Self
    }

    /// Decode a WAV file on disk
    pub fn load_path(&self, path: &Path) -> Result<DecodedAudioBuffer, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound {
                path: path.display().to_string(),
            });
        }

        let reader = WavReader::open(path).map_err(|e| LoadError::InvalidAudio {
            reason: format!("Failed to open WAV file: {}", e),
            source: Some(Box::new(e)),
        })?;
        decode_wav(reader)
    }

    /// Decode WAV data held in memory
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<DecodedAudioBuffer, LoadError> {
        let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| LoadError::InvalidAudio {
            reason: format!("Failed to parse WAV data: {}", e),
            source: Some(Box::new(e)),
        })?;
        decode_wav(reader)
    }
}

impl Loader for WavLoader {
    fn load(&self, source: &TrackSource) -> Result<DecodedAudioBuffer, LoadError> {
        match source {
            TrackSource::ByBlob(bytes) => self.load_bytes(bytes),
            TrackSource::ByReference(url) => {
                if url.starts_with("http://") || url.starts_with("https://") {
                    return Err(LoadError::UnsupportedSource {
                        source_desc: url.clone(),
                    });
                }
                let path = url.strip_prefix("file://").unwrap_or(url);
                self.load_path(Path::new(path))
            }
        }
    }
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn decode_wav<R: Read>(reader: WavReader<R>) -> Result<DecodedAudioBuffer, LoadError> {
    let spec = reader.spec();
    let channels = spec.channels as usize;

    if channels == 0 || channels > 2 {
        return Err(LoadError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }

    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if samples.len() < channels {
        return Err(LoadError::EmptyAudio);
    }

    DecodedAudioBuffer::from_channels(deinterleave(&samples, channels), spec.sample_rate)
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>, LoadError> {
    let invalid = |bits: &str, e: hound::Error| LoadError::InvalidAudio {
        reason: format!("Failed to read {} samples: {}", bits, e),
        source: Some(Box::new(e)),
    };

    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| invalid("float", e)),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| invalid("8-bit", e)),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| invalid("16-bit", e)),
        // 24-bit stored as i32 in hound
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| invalid("24-bit", e)),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| invalid("32-bit int", e)),
        (format, bits) => Err(LoadError::UnsupportedFormat {
            format: format!("{}-bit {:?} audio", bits, format),
        }),
    }
}

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];

    for frame in samples.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            result[ch].push(sample);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hound::{WavSpec, WavWriter};

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..frames * channels as usize {
            writer.write_sample((i % 100) as i16 * 100).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn wav_bytes(channels: u16, sample_rate: u32, frames: usize) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..frames * channels as usize {
                writer.write_sample(0.25_f32).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_load_path_reads_stereo_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 2, 8000, 4000);

        let buffer = WavLoader::new().load_path(&path).unwrap();
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.sample_rate(), 8000);
        assert_relative_eq!(buffer.duration_millis(), 500.0);
    }

    #[test]
    fn test_load_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 1, 8000, 800);

        let source = TrackSource::by_reference(format!("file://{}", path.display()));
        let buffer = WavLoader::new().load(&source).unwrap();
        assert_relative_eq!(buffer.duration_millis(), 100.0);
    }

    #[test]
    fn test_load_blob() {
        let source = TrackSource::by_blob(wav_bytes(1, 1000, 250));
        let buffer = WavLoader::new().load(&source).unwrap();
        assert_eq!(buffer.channels(), 1);
        assert_relative_eq!(buffer.duration_millis(), 250.0);
        assert_eq!(buffer.channel(0)[0], 0.25);
    }

    #[test]
    fn test_missing_file() {
        let source = TrackSource::by_reference("/definitely/not/here.wav");
        let result = WavLoader::new().load(&source);
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }

    #[test]
    fn test_remote_url_unsupported() {
        let source = TrackSource::by_reference("https://example.com/song.wav");
        let result = WavLoader::new().load(&source);
        assert!(matches!(result, Err(LoadError::UnsupportedSource { .. })));
    }

    #[test]
    fn test_garbage_blob_is_invalid() {
        let source = TrackSource::by_blob(vec![1u8, 2, 3, 4, 5]);
        let result = WavLoader::new().load(&source);
        assert!(matches!(result, Err(LoadError::InvalidAudio { .. })));
    }

    #[test]
    fn test_empty_wav_rejected() {
        let source = TrackSource::by_blob(wav_bytes(2, 44100, 0));
        let result = WavLoader::new().load(&source);
        assert!(matches!(result, Err(LoadError::EmptyAudio)));
    }

    #[test]
    fn test_deinterleave() {
        let channels = deinterleave(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(channels, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }
}
