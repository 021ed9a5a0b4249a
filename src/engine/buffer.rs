//! Decoded Audio Buffer
//!
//! The in-memory waveform a `Loader` produces and an `AudioBackend` plays.
//! Immutable once published to a track; shared through `Arc`.

use crate::error::LoadError;

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Decoded Audio Buffer
// ============================================================================

/// Decoded, non-interleaved 32-bit float audio
///
/// # Example
/// ```
/// use playhead::engine::{ChannelLayout, DecodedAudioBuffer};
///
/// let buffer = DecodedAudioBuffer::silent(44100, ChannelLayout::Stereo, 44100);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.duration_millis(), 1000.0);
/// ```
#[derive(Debug, Clone)]
pub struct DecodedAudioBuffer {
    samples: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl DecodedAudioBuffer {
    /// Create a zeroed buffer with `num_frames` frames per channel
    pub fn silent(num_frames: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_frames]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Create a buffer from per-channel sample vectors
    ///
    /// All channels must have the same length and there must be one or two
    /// of them.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, LoadError> {
        if ChannelLayout::from_count(samples.len()).is_none() {
            return Err(LoadError::UnsupportedFormat {
                format: format!("{}-channel audio (only mono/stereo supported)", samples.len()),
            });
        }
        let frames = samples[0].len();
        if samples.iter().any(|ch| ch.len() != frames) {
            return Err(LoadError::InvalidAudio {
                reason: "channels have different lengths".to_string(),
                source: None,
            });
        }
        if sample_rate == 0 {
            return Err(LoadError::InvalidAudio {
                reason: "sample rate is zero".to_string(),
                source: None,
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a buffer from interleaved sample data (L, R, L, R, ...)
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self, LoadError> {
        let num_channels = layout.num_channels();

        if interleaved.len() % num_channels != 0 {
            return Err(LoadError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
                source: None,
            });
        }

        let num_frames = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_frames); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Self::from_channels(samples, sample_rate)
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the channel layout
    pub fn channel_layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_count(self.channels())
    }

    /// Get the number of frames per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the duration in milliseconds
    #[inline]
    pub fn duration_millis(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_channel_layout_counts() {
        assert_eq!(ChannelLayout::Mono.num_channels(), 1);
        assert_eq!(ChannelLayout::Stereo.num_channels(), 2);
        assert_eq!(ChannelLayout::from_count(2), Some(ChannelLayout::Stereo));
        assert_eq!(ChannelLayout::from_count(6), None);
    }

    #[test]
    fn test_duration_millis() {
        let buffer = DecodedAudioBuffer::silent(22050, ChannelLayout::Mono, 44100);
        assert_relative_eq!(buffer.duration_millis(), 500.0);
    }

    #[test]
    fn test_from_interleaved_splits_channels() {
        let data = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer = DecodedAudioBuffer::from_interleaved(&data, ChannelLayout::Stereo, 48000)
            .unwrap();
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.channel(0), &[0.1, 0.2, 0.3]);
        assert_eq!(buffer.channel(1), &[-0.1, -0.2, -0.3]);
    }

    #[test]
    fn test_from_interleaved_rejects_ragged_data() {
        let data = [0.1, -0.1, 0.2];
        let result = DecodedAudioBuffer::from_interleaved(&data, ChannelLayout::Stereo, 48000);
        assert!(matches!(result, Err(LoadError::InvalidAudio { .. })));
    }

    #[test]
    fn test_from_channels_rejects_surround() {
        let result = DecodedAudioBuffer::from_channels(vec![vec![0.0; 4]; 6], 48000);
        assert!(matches!(result, Err(LoadError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_from_channels_rejects_mismatched_lengths() {
        let result = DecodedAudioBuffer::from_channels(vec![vec![0.0; 4], vec![0.0; 3]], 48000);
        assert!(result.is_err());
    }
}
