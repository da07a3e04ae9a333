//! Decoded multichannel audio

use serde::Serialize;

use crate::error::{Result, TapedeckError};

/// Decoded audio, one `f32` array per channel.
///
/// A buffer is immutable once constructed. Every derived buffer (trimmed,
/// resampled, gained) is a new value, so a single buffer can be shared behind
/// an `Arc` by the transport, the waveform renderer and an export worker.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
    frame_count: usize,
}

/// Serializable summary of a buffer (no sample data)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BufferInfo {
    pub channel_count: u16,
    pub sample_rate: u32,
    pub frame_count: usize,
    pub duration_secs: f64,
}

impl SampleBuffer {
    /// Build a buffer from per-channel sample arrays.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(TapedeckError::InvalidBuffer("sample rate must be > 0".into()));
        }
        if channels.is_empty() {
            return Err(TapedeckError::InvalidBuffer("at least one channel required".into()));
        }
        if channels.len() > u16::MAX as usize {
            return Err(TapedeckError::InvalidBuffer(format!(
                "too many channels: {}",
                channels.len()
            )));
        }

        let frame_count = channels[0].len();
        if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != frame_count) {
            return Err(TapedeckError::InvalidBuffer(format!(
                "channel {idx} has {} frames, expected {frame_count}",
                ch.len()
            )));
        }

        Ok(Self {
            channels,
            sample_rate,
            frame_count,
        })
    }

    /// Build a buffer from frame-major interleaved samples.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f32], channel_count: u16, sample_rate: u32) -> Result<Self> {
        if channel_count == 0 {
            return Err(TapedeckError::InvalidBuffer("at least one channel required".into()));
        }
        let n = channel_count as usize;
        let frames = samples.len() / n;
        let mut channels = vec![Vec::with_capacity(frames); n];

        for frame in samples.chunks_exact(n) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }

        Self::new(channels, sample_rate)
    }

    /// A buffer of `frame_count` zero samples per channel.
    pub fn silence(channel_count: u16, sample_rate: u32, frame_count: usize) -> Result<Self> {
        Self::new(vec![vec![0.0; frame_count]; channel_count as usize], sample_rate)
    }

    /// Construct from parts already known to satisfy the invariants.
    pub(crate) fn from_parts(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(!channels.is_empty());
        debug_assert!(channels.windows(2).all(|w| w[0].len() == w[1].len()));
        let frame_count = channels.first().map_or(0, Vec::len);
        Self {
            channels,
            sample_rate,
            frame_count,
        }
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Samples of one channel, `None` if out of range
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frame_count as f64 / self.sample_rate as f64
    }

    /// Iterate samples frame by frame, channels in order within each frame.
    pub fn interleaved(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.frame_count).flat_map(move |frame| self.channels.iter().map(move |ch| ch[frame]))
    }

    pub fn info(&self) -> BufferInfo {
        BufferInfo {
            channel_count: self.channel_count(),
            sample_rate: self.sample_rate,
            frame_count: self.frame_count,
            duration_secs: self.duration_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mismatched_channels() {
        let result = SampleBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100);
        assert!(matches!(result, Err(TapedeckError::InvalidBuffer(_))));
    }

    #[test]
    fn test_rejects_zero_rate_and_no_channels() {
        assert!(SampleBuffer::new(vec![vec![0.0; 4]], 0).is_err());
        assert!(SampleBuffer::new(Vec::new(), 44100).is_err());
    }

    #[test]
    fn test_interleave_round_trip() {
        let interleaved = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer = SampleBuffer::from_interleaved(&interleaved, 2, 8000).unwrap();

        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 3);
        assert_eq!(buffer.channel(0).unwrap(), &[0.1, 0.2, 0.3]);
        assert_eq!(buffer.channel(1).unwrap(), &[-0.1, -0.2, -0.3]);
        assert_eq!(buffer.interleaved().collect::<Vec<_>>(), interleaved);
    }

    #[test]
    fn test_duration() {
        let buffer = SampleBuffer::silence(1, 44100, 22050).unwrap();
        assert!((buffer.duration_secs() - 0.5).abs() < 1e-12);
        assert_eq!(buffer.info().frame_count, 22050);
    }
}
