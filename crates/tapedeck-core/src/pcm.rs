//! RIFF/WAVE 16-bit PCM encoder

use crate::buffer::SampleBuffer;
use crate::error::{Result, TapedeckError};

pub const HEADER_LEN: usize = 44;
const BYTES_PER_SAMPLE: u32 = 2;

/// Canonical 44-byte WAV header for 16-bit PCM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub data_size: u32,
}

impl WavHeader {
    pub fn for_buffer(buffer: &SampleBuffer) -> Result<Self> {
        Self::for_frames(buffer.channel_count(), buffer.sample_rate(), buffer.frame_count())
    }

    /// Header for `frame_count` frames; fails if any field overflows its
    /// on-disk width.
    pub fn for_frames(channels: u16, sample_rate: u32, frame_count: usize) -> Result<Self> {
        let block_align = channels.checked_mul(BYTES_PER_SAMPLE as u16).ok_or_else(|| {
            TapedeckError::EncodingFailure(format!("{channels} channels overflow the block alignment"))
        })?;

        let byte_rate = sample_rate.checked_mul(block_align as u32).ok_or_else(|| {
            TapedeckError::EncodingFailure(format!(
                "{sample_rate} Hz x {channels} channels overflows the byte rate"
            ))
        })?;

        let data_size = (frame_count as u64)
            .checked_mul(block_align as u64)
            .and_then(|size| u32::try_from(size).ok())
            .filter(|&size| size.checked_add(36).is_some())
            .ok_or_else(|| {
                TapedeckError::EncodingFailure(format!(
                    "{frame_count} frames x {channels} channels does not fit a RIFF container"
                ))
            })?;

        Ok(Self {
            channels,
            sample_rate,
            byte_rate,
            block_align,
            data_size,
        })
    }

    /// Total file size: header plus data
    pub fn file_size(&self) -> usize {
        HEADER_LEN + self.data_size as usize
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(b"RIFF");
        out[4..8].copy_from_slice(&(36 + self.data_size).to_le_bytes());
        out[8..12].copy_from_slice(b"WAVE");

        out[12..16].copy_from_slice(b"fmt ");
        out[16..20].copy_from_slice(&16u32.to_le_bytes());
        out[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
        out[22..24].copy_from_slice(&self.channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        out[34..36].copy_from_slice(&16u16.to_le_bytes());

        out[36..40].copy_from_slice(b"data");
        out[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        out
    }
}

/// Convert a float sample to signed 16-bit.
///
/// Negative values scale by 32768 and positive by 32767, so -1.0 and 1.0
/// map to `i16::MIN` and `i16::MAX`. Rounds to nearest.
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32768.0).round() as i16
    } else {
        (s * 32767.0).round() as i16
    }
}

/// Inverse of [`sample_to_i16`]
pub fn i16_to_sample(value: i16) -> f32 {
    if value < 0 {
        value as f32 / 32768.0
    } else {
        value as f32 / 32767.0
    }
}

/// Serialize `buffer` as a 16-bit PCM WAV file.
pub fn encode_wav(buffer: &SampleBuffer) -> Result<Vec<u8>> {
    let header = WavHeader::for_buffer(buffer)?;

    let mut out = Vec::with_capacity(header.file_size());
    out.extend_from_slice(&header.to_bytes());
    for sample in buffer.interleaved() {
        out.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
    }

    if out.len() != header.file_size() {
        return Err(TapedeckError::EncodingFailure(format!(
            "wrote {} bytes, header declares {}",
            out.len(),
            header.file_size()
        )));
    }

    Ok(out)
}
