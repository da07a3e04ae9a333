//! Audio output for a sample buffer
//!
//! The playback node only produces sound. Logical position belongs to the
//! `Transport`; the host starts a node at the transport position on play and
//! drops it on pause or seek.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use tapedeck_core::SampleBuffer;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("No audio output devices found")]
    NoDevices,
    #[error("Failed to get default output config: {0}")]
    ConfigError(String),
    #[error("Failed to build output stream: {0}")]
    StreamError(String),
    #[error("Resample error: {0}")]
    ResampleError(String),
}

/// Default output device description
#[derive(Debug, Clone, serde::Serialize)]
pub struct OutputDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Streams part of a buffer to the default output device
pub struct PlaybackNode {
    stop_flag: Arc<AtomicBool>,
    position: Arc<AtomicUsize>,
    total_samples: usize,
    device_channels: usize,
    device_rate: u32,
    _stream: cpal::Stream,
}

impl PlaybackNode {
    /// Start output from `offset_secs` into `buffer`
    pub fn start(buffer: &SampleBuffer, offset_secs: f64) -> Result<Self, PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlaybackError::NoDevices)?;

        let supported_config = device
            .default_output_config()
            .map_err(|e| PlaybackError::ConfigError(e.to_string()))?;

        let device_rate = supported_config.sample_rate().0;
        let device_channels = supported_config.channels() as usize;

        let start_frame = ((offset_secs.max(0.0) * buffer.sample_rate() as f64) as usize)
            .min(buffer.frame_count());
        let remaining: Vec<Vec<f32>> = buffer
            .channels()
            .iter()
            .map(|ch| ch[start_frame..].to_vec())
            .collect();

        let resampled = resample_if_needed(remaining, buffer.sample_rate(), device_rate)?;
        let output = spread_to_device(&resampled, device_channels);

        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = device_rate,
            channels = device_channels,
            offset_secs,
            "Starting playback"
        );

        let samples = Arc::new(output);
        let total_samples = samples.len();
        let position = Arc::new(AtomicUsize::new(0));
        let stop_flag = Arc::new(AtomicBool::new(false));

        let position_cb = position.clone();
        let stop_cb = stop_flag.clone();
        let samples_cb = samples.clone();

        let config: StreamConfig = supported_config.into();

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if stop_cb.load(Ordering::SeqCst) {
                        data.fill(0.0);
                        return;
                    }
                    let pos = position_cb.load(Ordering::SeqCst);
                    for (i, sample) in data.iter_mut().enumerate() {
                        *sample = samples_cb.get(pos + i).copied().unwrap_or(0.0);
                    }
                    position_cb.store((pos + data.len()).min(total_samples), Ordering::SeqCst);
                },
                move |err| error!("Playback stream error: {}", err),
                None,
            )
            .map_err(|e| PlaybackError::StreamError(e.to_string()))?;

        stream.play().map_err(|e| PlaybackError::StreamError(e.to_string()))?;

        Ok(Self {
            stop_flag,
            position,
            total_samples,
            device_channels,
            device_rate,
            _stream: stream,
        })
    }

    /// Silence output; the stream is released on drop
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// All queued audio has been handed to the device
    pub fn is_finished(&self) -> bool {
        self.position.load(Ordering::SeqCst) >= self.total_samples
    }

    /// Seconds of audio handed to the device since start
    pub fn elapsed_secs(&self) -> f64 {
        interleaved_secs(self.position.load(Ordering::SeqCst), self.device_channels, self.device_rate)
    }

    /// Describe the default output device
    pub fn default_device_info() -> Result<OutputDeviceInfo, PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlaybackError::NoDevices)?;

        let config = device
            .default_output_config()
            .map_err(|e| PlaybackError::ConfigError(e.to_string()))?;

        Ok(OutputDeviceInfo {
            name: device.name().unwrap_or_default(),
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
        })
    }
}

impl Drop for PlaybackNode {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }
}

fn interleaved_secs(samples: usize, channels: usize, rate: u32) -> f64 {
    if rate == 0 {
        return 0.0;
    }
    (samples / channels.max(1)) as f64 / rate as f64
}

fn resample_if_needed(
    channels: Vec<Vec<f32>>,
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<Vec<f32>>, PlaybackError> {
    let frames = channels.first().map_or(0, Vec::len);
    if from_rate == to_rate || frames == 0 {
        return Ok(channels);
    }

    use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        2.0,
        params,
        frames,
        channels.len(),
    )
    .map_err(|e| PlaybackError::ResampleError(format!("init: {}", e)))?;

    resampler
        .process(&channels, None)
        .map_err(|e| PlaybackError::ResampleError(e.to_string()))
}

/// Interleave source channels into `device_channels` outputs.
///
/// Mono sources are copied to every output; extra device channels repeat
/// the last source channel.
fn spread_to_device(channels: &[Vec<f32>], device_channels: usize) -> Vec<f32> {
    let frames = channels.first().map_or(0, Vec::len);
    let last = channels.len().saturating_sub(1);
    let mut out = Vec::with_capacity(frames * device_channels);

    for frame in 0..frames {
        for out_ch in 0..device_channels {
            out.push(channels[out_ch.min(last)][frame]);
        }
    }
    out
}
