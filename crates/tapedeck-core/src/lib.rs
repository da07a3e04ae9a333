//! tapedeck-core: Transport, waveform, edit and PCM encoding for a single audio buffer

mod buffer;
mod clock;
mod edit;
pub mod envelope;
mod error;
pub mod pcm;
pub mod pipeline;
mod transport;

pub use buffer::{BufferInfo, SampleBuffer};
pub use clock::{ClockSource, ManualClock, SystemClock};
pub use edit::EditParameters;
pub use envelope::{EnvelopeColumn, WaveformEnvelope};
pub use error::{Result, TapedeckError};
pub use pcm::{encode_wav, WavHeader};
pub use pipeline::{render, Stage};
pub use transport::{format_time, Transport, TransportState, TransportTick};
