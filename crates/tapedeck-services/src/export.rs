//! Export coordination: edit pipeline -> WAV encoder, with progress and cancellation
//!
//! Stage lifecycle reported to the caller:
//!
//! Started (0%) → Trim (25%) → Resample (50%) → Gain (75%) → Encode (100%)
//!
//! Cancellation is checked before every stage. A cancelled or failed export
//! never yields bytes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver};
use tapedeck_core::{encode_wav, pipeline, EditParameters, SampleBuffer, Stage, TapedeckError, WavHeader};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export failed: {0}")]
    Core(#[from] TapedeckError),
    #[error("Failed to spawn export worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Export worker exited without a result")]
    WorkerLost,
}

/// Shared cancellation flag for an in-flight export
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress report, sent at stage boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ExportProgress {
    /// Overall progress, 0..=100, never decreasing within one export
    pub percent: u8,
    /// Stage that just finished; `None` for the initial report
    pub completed: Option<Stage>,
}

impl ExportProgress {
    fn started() -> Self {
        Self { percent: 0, completed: None }
    }

    fn after(stage: Stage) -> Self {
        let index = Stage::ALL.iter().position(|s| *s == stage).unwrap_or(0);
        let percent = ((index + 1) * 100 / Stage::ALL.len()) as u8;
        Self { percent, completed: Some(stage) }
    }
}

/// Terminal state of a successful export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Complete WAV file bytes
    Completed(Vec<u8>),
    /// Stopped on host request before finishing
    Cancelled,
}

impl ExportOutcome {
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Completed(bytes) => Some(bytes),
            Self::Cancelled => None,
        }
    }
}

/// Runs the edit pipeline and encoder stage by stage on the calling thread
pub struct ExportCoordinator;

impl ExportCoordinator {
    pub fn run<F>(
        buffer: &SampleBuffer,
        params: &EditParameters,
        cancel: &CancelToken,
        mut on_progress: F,
    ) -> Result<ExportOutcome, ExportError>
    where
        F: FnMut(ExportProgress),
    {
        if params.trim_end_secs() > buffer.duration_secs() {
            return Err(TapedeckError::InvalidParameters(format!(
                "trim end {} is past the buffer duration {}",
                params.trim_end_secs(),
                buffer.duration_secs()
            ))
            .into());
        }

        // Output must fit a RIFF container before anything is rendered
        let out_frames = pipeline::rendered_frame_count(buffer, params);
        WavHeader::for_frames(buffer.channel_count(), buffer.sample_rate(), out_frames)?;

        info!(
            frames = buffer.frame_count(),
            channels = buffer.channel_count(),
            gain = params.gain(),
            speed = params.speed_factor(),
            trim_start = params.trim_start_secs(),
            trim_end = params.trim_end_secs(),
            "Export started"
        );
        on_progress(ExportProgress::started());

        if Self::cancelled(cancel, Stage::Trim) {
            return Ok(ExportOutcome::Cancelled);
        }
        let trimmed = pipeline::trim(buffer, params.trim_start_secs(), params.trim_end_secs());
        Self::complete(Stage::Trim, &mut on_progress);

        if Self::cancelled(cancel, Stage::Resample) {
            return Ok(ExportOutcome::Cancelled);
        }
        let resampled = pipeline::resample(&trimmed, params.speed_factor());
        drop(trimmed);
        Self::complete(Stage::Resample, &mut on_progress);

        if Self::cancelled(cancel, Stage::Gain) {
            return Ok(ExportOutcome::Cancelled);
        }
        let rendered = pipeline::apply_gain(&resampled, params.gain());
        drop(resampled);
        Self::complete(Stage::Gain, &mut on_progress);

        if Self::cancelled(cancel, Stage::Encode) {
            return Ok(ExportOutcome::Cancelled);
        }
        let bytes = encode_wav(&rendered)?;
        Self::complete(Stage::Encode, &mut on_progress);

        info!(frames = rendered.frame_count(), bytes = bytes.len(), "Export complete");
        Ok(ExportOutcome::Completed(bytes))
    }

    fn cancelled(cancel: &CancelToken, next: Stage) -> bool {
        if cancel.is_cancelled() {
            warn!(stage = next.name(), "Export cancelled");
            return true;
        }
        false
    }

    fn complete<F: FnMut(ExportProgress)>(stage: Stage, on_progress: &mut F) {
        let progress = ExportProgress::after(stage);
        debug!(stage = stage.name(), percent = progress.percent, "Export stage complete");
        on_progress(progress);
    }
}

/// Handle to an export running on a worker thread
pub struct ExportHandle {
    progress_rx: Receiver<ExportProgress>,
    result_rx: Receiver<Result<ExportOutcome, ExportError>>,
    worker: Option<JoinHandle<()>>,
}

impl ExportHandle {
    /// Progress stream; closes when the worker finishes
    pub fn progress(&self) -> &Receiver<ExportProgress> {
        &self.progress_rx
    }

    /// Block until the worker finishes
    pub fn wait(mut self) -> Result<ExportOutcome, ExportError> {
        let result = self.result_rx.recv().map_err(|_| ExportError::WorkerLost);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        result?
    }
}

/// Runs exports off the caller's thread
pub struct ExportService;

impl ExportService {
    pub fn start(buffer: Arc<SampleBuffer>, params: EditParameters) -> Result<ExportHandle, ExportError> {
        Self::start_with_cancel(buffer, params, CancelToken::new())
    }

    /// Start with a caller-owned cancellation token
    pub fn start_with_cancel(
        buffer: Arc<SampleBuffer>,
        params: EditParameters,
        cancel: CancelToken,
    ) -> Result<ExportHandle, ExportError> {
        let (progress_tx, progress_rx) = unbounded();
        let (result_tx, result_rx) = bounded(1);

        let worker = thread::Builder::new()
            .name("tapedeck-export".into())
            .spawn(move || {
                let result = ExportCoordinator::run(&buffer, &params, &cancel, |p| {
                    let _ = progress_tx.send(p);
                });
                let _ = result_tx.send(result);
            })?;

        Ok(ExportHandle {
            progress_rx,
            result_rx,
            worker: Some(worker),
        })
    }
}
