//! tapedeck-services: Export coordination, decoding, delivery and audio output

pub mod decoder;
pub mod delivery;
pub mod export;
pub mod playback;

pub use decoder::{decode_wav_bytes, decode_wav_file, DecodeError};
pub use delivery::{deliver, suggested_file_name, DeliveryError, DeliverySink, FileSink, MemorySink};
pub use export::{
    CancelToken, ExportCoordinator, ExportError, ExportHandle, ExportOutcome, ExportProgress,
    ExportService,
};
pub use playback::{OutputDeviceInfo, PlaybackError, PlaybackNode};
