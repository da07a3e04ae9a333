//! WAV decoding into a `SampleBuffer`

use std::io::{Cursor, Read};
use std::path::Path;

use tapedeck_core::{pcm, SampleBuffer, TapedeckError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Unsupported sample format: {format:?} at {bits} bits")]
    UnsupportedFormat {
        format: hound::SampleFormat,
        bits: u16,
    },
    #[error("Decoded audio is invalid: {0}")]
    Buffer(#[from] TapedeckError),
}

/// Decode a WAV file from disk
pub fn decode_wav_file(path: &Path) -> Result<SampleBuffer, DecodeError> {
    let reader = hound::WavReader::open(path)?;
    let buffer = decode_reader(reader)?;
    debug!(
        path = %path.display(),
        channels = buffer.channel_count(),
        sample_rate = buffer.sample_rate(),
        frames = buffer.frame_count(),
        "Decoded WAV file"
    );
    Ok(buffer)
}

/// Decode WAV bytes held in memory
pub fn decode_wav_bytes(bytes: &[u8]) -> Result<SampleBuffer, DecodeError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    decode_reader(reader)
}

fn decode_reader<R: Read>(reader: hound::WavReader<R>) -> Result<SampleBuffer, DecodeError> {
    let spec = reader.spec();

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => {
            reader.into_samples::<f32>().collect::<Result<_, _>>()?
        }
        (hound::SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .map(|s| s.map(pcm::i16_to_sample))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, bits @ (8 | 24 | 32)) => {
            let max_val = (1_i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<_, _>>()?
        }
        (format, bits) => return Err(DecodeError::UnsupportedFormat { format, bits }),
    };

    Ok(SampleBuffer::from_interleaved(&interleaved, spec.channels, spec.sample_rate)?)
}
