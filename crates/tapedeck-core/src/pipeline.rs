//! Non-destructive edit rendering: trim, speed, gain
//!
//! Stages always run in this order. Each stage is a pure function from one
//! buffer to a new one, so a coordinator can run them one at a time and stop
//! between any two.

use std::ops::Range;

use serde::Serialize;

use crate::buffer::SampleBuffer;
use crate::edit::EditParameters;

/// Export stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Trim,
    Resample,
    Gain,
    Encode,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Trim, Stage::Resample, Stage::Gain, Stage::Encode];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Trim => "trim",
            Self::Resample => "resample",
            Self::Gain => "gain",
            Self::Encode => "encode",
        }
    }
}

/// Render `params` against `source`, producing a new buffer.
pub fn render(source: &SampleBuffer, params: &EditParameters) -> SampleBuffer {
    let trimmed = trim(source, params.trim_start_secs(), params.trim_end_secs());
    let resampled = resample(&trimmed, params.speed_factor());
    apply_gain(&resampled, params.gain())
}

/// Keep frames `[floor(start * rate), ceil(end * rate))`, clamped to the buffer.
pub fn trim(buffer: &SampleBuffer, start_secs: f64, end_secs: f64) -> SampleBuffer {
    let range = trim_range(buffer, start_secs, end_secs);
    let channels = buffer.channels().iter().map(|ch| ch[range.clone()].to_vec()).collect();
    SampleBuffer::from_parts(channels, buffer.sample_rate())
}

fn trim_range(buffer: &SampleBuffer, start_secs: f64, end_secs: f64) -> Range<usize> {
    let rate = buffer.sample_rate() as f64;
    let end = ((end_secs * rate).ceil().max(0.0) as usize).min(buffer.frame_count());
    let start = ((start_secs * rate).floor().max(0.0) as usize).min(end);
    start..end
}

/// Frames [`resample`] produces from `frames` input frames
pub fn resampled_frame_count(frames: usize, speed_factor: f64) -> usize {
    if frames == 0 || speed_factor == 1.0 {
        return frames;
    }
    // saturating float-to-int cast
    (frames as f64 / speed_factor).round() as usize
}

/// Frames [`render`] would produce, computed without rendering
pub fn rendered_frame_count(source: &SampleBuffer, params: &EditParameters) -> usize {
    let trimmed = trim_range(source, params.trim_start_secs(), params.trim_end_secs()).len();
    resampled_frame_count(trimmed, params.speed_factor())
}

/// Change playback rate by `speed_factor` using linear interpolation.
///
/// The output holds `round(frames / speed_factor)` frames at the same sample
/// rate, so pitch moves with speed.
pub fn resample(buffer: &SampleBuffer, speed_factor: f64) -> SampleBuffer {
    if speed_factor == 1.0 {
        return buffer.clone();
    }

    let out_frames = resampled_frame_count(buffer.frame_count(), speed_factor);

    let channels = buffer
        .channels()
        .iter()
        .map(|ch| resample_channel(ch, speed_factor, out_frames))
        .collect();
    SampleBuffer::from_parts(channels, buffer.sample_rate())
}

fn resample_channel(samples: &[f32], speed_factor: f64, out_frames: usize) -> Vec<f32> {
    let Some(last) = samples.len().checked_sub(1) else {
        return vec![0.0; out_frames];
    };

    (0..out_frames)
        .map(|j| {
            let pos = j as f64 * speed_factor;
            let idx = (pos.floor() as usize).min(last);
            let frac = (pos - idx as f64).clamp(0.0, 1.0) as f32;
            let a = samples[idx];
            let b = samples[(idx + 1).min(last)];
            a + (b - a) * frac
        })
        .collect()
}

/// Multiply every sample by `gain`, clamping to `[-1, 1]`.
pub fn apply_gain(buffer: &SampleBuffer, gain: f32) -> SampleBuffer {
    let channels = buffer
        .channels()
        .iter()
        .map(|ch| ch.iter().map(|&s| (s * gain).clamp(-1.0, 1.0)).collect())
        .collect();
    SampleBuffer::from_parts(channels, buffer.sample_rate())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, sample_rate: u32) -> SampleBuffer {
        let left = (0..frames).map(|i| i as f32 / frames as f32).collect();
        let right = (0..frames).map(|i| -(i as f32) / frames as f32).collect();
        SampleBuffer::new(vec![left, right], sample_rate).unwrap()
    }

    #[test]
    fn test_identity_reproduces_source() {
        let source = ramp(1000, 8000);
        let params = EditParameters::identity(source.duration_secs()).unwrap();
        let rendered = render(&source, &params);
        assert_eq!(rendered, source);
    }

    #[test]
    fn test_trim_silence_scenario() {
        let source = SampleBuffer::silence(1, 44100, 44100).unwrap();
        let params = EditParameters::new(2.0, 1.0, 0.25, 0.75, source.duration_secs()).unwrap();
        let rendered = render(&source, &params);

        assert_eq!(rendered.frame_count(), 22050);
        assert_eq!(rendered.sample_rate(), 44100);
        assert_eq!(rendered.channel_count(), 1);
        assert!(rendered.channel(0).unwrap().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_trim_frame_bounds() {
        let source = ramp(100, 100);
        let trimmed = trim(&source, 0.105, 0.201);
        // floor(10.5) = 10, ceil(20.1) = 21
        assert_eq!(trimmed.frame_count(), 11);
        assert_eq!(trimmed.channel(0).unwrap()[0], source.channel(0).unwrap()[10]);
    }

    #[test]
    fn test_resample_frame_counts() {
        let source = ramp(1000, 8000);
        assert_eq!(resample(&source, 2.0).frame_count(), 500);
        assert_eq!(resample(&source, 0.5).frame_count(), 2000);
        assert_eq!(resample(&source, 1.5).frame_count(), 667);
        assert_eq!(resample(&source, 0.5).sample_rate(), 8000);
    }

    #[test]
    fn test_resample_interpolates() {
        let source = SampleBuffer::new(vec![vec![0.0, 1.0, 0.0]], 10).unwrap();
        let slowed = resample(&source, 0.5);
        assert_eq!(slowed.channel(0).unwrap(), &[0.0, 0.5, 1.0, 0.5, 0.0, 0.0]);

        let fast = resample(&source, 2.0);
        // round(3 / 2) = 2 frames at positions 0 and 2
        assert_eq!(fast.channel(0).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_resample_empty() {
        let source = SampleBuffer::silence(2, 8000, 0).unwrap();
        assert_eq!(resample(&source, 0.5).frame_count(), 0);
    }

    #[test]
    fn test_gain_clamps() {
        let source = SampleBuffer::new(vec![vec![0.25, -0.4, 0.8, -0.9]], 10).unwrap();
        let gained = apply_gain(&source, 2.0);
        assert_eq!(gained.channel(0).unwrap(), &[0.5, -0.8, 1.0, -1.0]);
    }

    #[test]
    fn test_render_does_not_touch_source() {
        let source = ramp(400, 400);
        let copy = source.clone();
        let params = EditParameters::new(3.0, 1.25, 0.1, 0.9, 1.0).unwrap();
        let rendered = render(&source, &params);

        assert_eq!(source, copy);
        // 0.1..0.9 s at 400 Hz is frames 40..360 = 320 frames, / 1.25 = 256
        assert_eq!(rendered.frame_count(), 256);
        assert_eq!(rendered.channel_count(), 2);
    }

    #[test]
    fn test_rendered_frame_count_matches_render() {
        let source = ramp(400, 400);
        let params = EditParameters::new(3.0, 1.25, 0.1, 0.9, 1.0).unwrap();
        assert_eq!(rendered_frame_count(&source, &params), render(&source, &params).frame_count());

        // a tiny speed factor is sized without allocating
        let slow = EditParameters::new(1.0, 1e-9, 0.0, 1.0, 1.0).unwrap();
        assert_eq!(rendered_frame_count(&source, &slow), 400_000_000_000);
    }
}
