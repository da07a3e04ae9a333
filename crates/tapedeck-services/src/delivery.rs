//! Delivery of exported bytes to their destination

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid file name: {0:?}")]
    InvalidName(String),
}

const DEFAULT_STEM: &str = "audio-file";

/// Destination for a finished export
pub trait DeliverySink {
    fn deliver(&mut self, bytes: &[u8], suggested_name: &str) -> Result<(), DeliveryError>;
}

/// Export file name for a source: the source stem with a `.wav` extension
pub fn suggested_file_name(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_STEM);
    format!("{stem}.wav")
}

/// Writes exports into a directory
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    last_written: Option<PathBuf>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_written: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the most recent successful delivery
    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }

    /// Write `bytes` to `<dir>/<name>`, going through a temporary file so a
    /// failed write never leaves a truncated export behind.
    pub fn write(&mut self, bytes: &[u8], name: &str) -> Result<PathBuf, DeliveryError> {
        let file_name = Path::new(name)
            .file_name()
            .filter(|n| *n == name)
            .ok_or_else(|| DeliveryError::InvalidName(name.to_string()))?;

        fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(file_name);
        let partial = self.dir.join(format!("{name}.part"));

        write_then_rename(&partial, &target, |path| fs::write(path, bytes))?;

        info!(path = %target.display(), bytes = bytes.len(), "Export written");
        self.last_written = Some(target.clone());
        Ok(target)
    }
}

impl DeliverySink for FileSink {
    fn deliver(&mut self, bytes: &[u8], suggested_name: &str) -> Result<(), DeliveryError> {
        self.write(bytes, suggested_name).map(|_| ())
    }
}

/// Keeps deliveries in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl DeliverySink for MemorySink {
    fn deliver(&mut self, bytes: &[u8], suggested_name: &str) -> Result<(), DeliveryError> {
        self.files.push((suggested_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}

/// Run `write` against `partial`, then move it to `target`. The partial
/// file is removed if either step fails.
fn write_then_rename<F>(partial: &Path, target: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    let result = write(partial).and_then(|()| fs::rename(partial, target));
    if result.is_err() {
        let _ = fs::remove_file(partial);
    }
    result
}

/// Deliver export bytes under the name derived from `source_name`.
/// Returns the name used.
pub fn deliver(
    sink: &mut dyn DeliverySink,
    bytes: &[u8],
    source_name: &str,
) -> Result<String, DeliveryError> {
    let name = suggested_file_name(source_name);
    sink.deliver(bytes, &name)?;
    Ok(name)
}
