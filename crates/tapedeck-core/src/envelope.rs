//! Min/max waveform envelope for display

use serde::Serialize;

use crate::buffer::SampleBuffer;

/// One rendered column of the waveform
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EnvelopeColumn {
    pub min: f32,
    pub max: f32,
}

impl EnvelopeColumn {
    /// Vertical pixel span `(y_min, y_max)` for a canvas of `height` pixels,
    /// with -1.0 at the top edge and 1.0 at the bottom.
    pub fn to_pixel_span(&self, height: f32) -> (f32, f32) {
        (((self.min + 1.0) / 2.0) * height, ((self.max + 1.0) / 2.0) * height)
    }
}

/// Per-column min/max summary of channel 0 of a buffer
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WaveformEnvelope {
    columns: Vec<EnvelopeColumn>,
}

impl WaveformEnvelope {
    /// Reduce channel 0 of `buffer` to `column_count` columns.
    ///
    /// Stereo and multichannel sources are not averaged; channel 0 alone is
    /// the visual summary.
    pub fn compute(buffer: &SampleBuffer, column_count: usize) -> Self {
        Self::from_samples(buffer.channel(0).unwrap_or(&[]), column_count)
    }

    /// Reduce a single channel of samples to `column_count` columns.
    ///
    /// Column `i` covers `[i * step, min((i + 1) * step, len))` where
    /// `step = ceil(len / column_count)`. Columns whose window holds no
    /// samples are `(0, 0)`.
    pub fn from_samples(samples: &[f32], column_count: usize) -> Self {
        if column_count == 0 {
            return Self::default();
        }

        let len = samples.len();
        let step = len.div_ceil(column_count);

        let columns = (0..column_count)
            .map(|i| {
                let start = (i * step).min(len);
                let end = ((i + 1) * step).min(len);
                column_for(&samples[start..end])
            })
            .collect();

        Self { columns }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[EnvelopeColumn] {
        &self.columns
    }

    /// Largest absolute value over all columns
    pub fn peak(&self) -> f32 {
        self.columns
            .iter()
            .map(|c| c.min.abs().max(c.max.abs()))
            .fold(0.0f32, f32::max)
    }
}

fn column_for(window: &[f32]) -> EnvelopeColumn {
    if window.is_empty() {
        return EnvelopeColumn::default();
    }

    let (min, max) = window
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));

    // NaN-only windows fold to (inf, -inf)
    if min > max {
        return EnvelopeColumn::default();
    }

    EnvelopeColumn {
        min: min.clamp(-1.0, 1.0),
        max: max.clamp(-1.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(len: usize, seed: u64) -> Vec<f32> {
        let mut rng = fastrand::Rng::with_seed(seed);
        (0..len).map(|_| rng.f32() * 2.4 - 1.2).collect()
    }

    #[test]
    fn test_column_count_matches_request() {
        for (len, seed) in [(0, 1), (1, 2), (7, 3), (1000, 4), (44100, 5)] {
            let samples = noise(len, seed);
            for n in [1, 2, 3, 10, 99, 640, 2000] {
                let env = WaveformEnvelope::from_samples(&samples, n);
                assert_eq!(env.column_count(), n, "len={len} n={n}");
            }
        }
    }

    #[test]
    fn test_columns_ordered_and_bounded() {
        let samples = noise(10_000, 42);
        let env = WaveformEnvelope::from_samples(&samples, 333);
        for col in env.columns() {
            assert!(col.min <= col.max);
            assert!((-1.0..=1.0).contains(&col.min));
            assert!((-1.0..=1.0).contains(&col.max));
        }
    }

    #[test]
    fn test_window_min_max() {
        let samples = [0.1, -0.5, 0.3, 0.9, -0.2, 0.0];
        let env = WaveformEnvelope::from_samples(&samples, 2);
        assert_eq!(env.columns()[0], EnvelopeColumn { min: -0.5, max: 0.3 });
        assert_eq!(env.columns()[1], EnvelopeColumn { min: -0.2, max: 0.9 });
        assert_eq!(env.peak(), 0.9);
    }

    #[test]
    fn test_more_columns_than_frames() {
        let samples = [0.25, -0.75, 0.5];
        let env = WaveformEnvelope::from_samples(&samples, 5);
        let cols = env.columns();
        assert_eq!(cols[0], EnvelopeColumn { min: 0.25, max: 0.25 });
        assert_eq!(cols[1], EnvelopeColumn { min: -0.75, max: -0.75 });
        assert_eq!(cols[2], EnvelopeColumn { min: 0.5, max: 0.5 });
        assert_eq!(cols[3], EnvelopeColumn::default());
        assert_eq!(cols[4], EnvelopeColumn::default());
    }

    #[test]
    fn test_empty_buffer_gives_zero_columns() {
        let buffer = SampleBuffer::silence(2, 44100, 0).unwrap();
        let env = WaveformEnvelope::compute(&buffer, 4);
        assert_eq!(env.columns(), &[EnvelopeColumn::default(); 4]);
    }

    #[test]
    fn test_uses_channel_zero_only() {
        let buffer = SampleBuffer::new(vec![vec![0.5; 8], vec![-1.0; 8]], 8000).unwrap();
        let env = WaveformEnvelope::compute(&buffer, 2);
        for col in env.columns() {
            assert_eq!(*col, EnvelopeColumn { min: 0.5, max: 0.5 });
        }
    }

    #[test]
    fn test_deterministic() {
        let samples = noise(5000, 7);
        assert_eq!(
            WaveformEnvelope::from_samples(&samples, 123),
            WaveformEnvelope::from_samples(&samples, 123)
        );
    }

    #[test]
    fn test_pixel_span() {
        let col = EnvelopeColumn { min: -1.0, max: 0.0 };
        assert_eq!(col.to_pixel_span(100.0), (0.0, 50.0));
    }
}
