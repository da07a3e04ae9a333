//! Command handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use tapedeck_core::{
    format_time, EditParameters, SampleBuffer, SystemClock, Transport, WaveformEnvelope,
};
use tapedeck_services::{
    decode_wav_file, deliver, ExportOutcome, ExportService, FileSink, PlaybackNode,
};
use tracing::{debug, info, warn};

use crate::config::{self, AppConfig};

const WAVEFORM_ROWS: usize = 12;

fn load(path: &Path) -> anyhow::Result<SampleBuffer> {
    decode_wav_file(path).with_context(|| format!("failed to decode {}", path.display()))
}

pub(crate) fn info(path: &Path) -> anyhow::Result<()> {
    let buffer = load(path)?;
    println!("{}", serde_json::to_string_pretty(&buffer.info())?);
    Ok(())
}

pub(crate) fn waveform(path: &Path, columns: Option<usize>, config: &AppConfig) -> anyhow::Result<()> {
    let buffer = load(path)?;
    let columns = columns.unwrap_or(config.waveform.columns).max(1);
    let envelope = WaveformEnvelope::compute(&buffer, columns);

    for line in render_rows(&envelope, WAVEFORM_ROWS) {
        println!("{line}");
    }
    println!(
        "{} / peak {:.3}",
        format_time(buffer.duration_secs()),
        envelope.peak()
    );
    Ok(())
}

/// Text rendering of an envelope, +1.0 on the top row
fn render_rows(envelope: &WaveformEnvelope, rows: usize) -> Vec<String> {
    (0..rows)
        .map(|row| {
            let top = 1.0 - 2.0 * row as f32 / rows as f32;
            let bottom = 1.0 - 2.0 * (row + 1) as f32 / rows as f32;
            envelope
                .columns()
                .iter()
                .map(|c| if c.max >= bottom && c.min <= top { '#' } else { ' ' })
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect()
}

pub(crate) struct ExportRequest {
    pub path: PathBuf,
    pub gain: f32,
    pub speed: f64,
    pub trim_start: Option<f64>,
    pub trim_end: Option<f64>,
    pub out: Option<PathBuf>,
}

pub(crate) fn export(request: ExportRequest, config: &AppConfig) -> anyhow::Result<()> {
    let buffer = Arc::new(load(&request.path)?);
    let duration = buffer.duration_secs();

    let params = EditParameters::new(
        request.gain,
        request.speed,
        request.trim_start.unwrap_or(0.0),
        request.trim_end.unwrap_or(duration),
        duration,
    )?;

    let handle = ExportService::start(buffer, params)?;
    let progress = handle.progress().clone();
    for p in progress.iter() {
        let stage = p.completed.map_or("start", |s| s.name());
        info!(percent = p.percent, stage, "Export progress");
    }

    match handle.wait()? {
        ExportOutcome::Completed(bytes) => {
            let dir = request
                .out
                .or_else(|| config.export.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            let mut sink = FileSink::new(dir);
            let source_name = request
                .path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            deliver(&mut sink, &bytes, source_name)?;
            if let Some(path) = sink.last_written() {
                println!("{}", path.display());
            }
        }
        ExportOutcome::Cancelled => warn!("Export cancelled, nothing written"),
    }
    Ok(())
}

pub(crate) fn play(path: &Path, from: f64, config: &AppConfig) -> anyhow::Result<()> {
    let buffer = load(path)?;
    let mut transport = Transport::new(SystemClock::new());
    transport.attach(&buffer);
    transport.seek(from);
    transport.play();

    let node = PlaybackNode::start(&buffer, transport.current_position())?;
    let poll_interval = Duration::from_secs_f64(1.0 / config.playback.poll_hz.max(1) as f64);
    let total = format_time(transport.duration_secs());
    let mut last_shown = None;

    info!(file = %path.display(), from = transport.current_position(), "Playing");

    loop {
        thread::sleep(poll_interval);
        let tick = transport.poll();

        let shown = format_time(tick.position_secs);
        if last_shown.as_ref() != Some(&shown) {
            println!("{shown} / {total}");
            last_shown = Some(shown);
        }

        if tick.reached_end || node.is_finished() {
            debug!(position = tick.position_secs, device = node.elapsed_secs(), "Playback reached end");
            break;
        }
    }

    node.stop();
    info!("Playback finished");
    Ok(())
}

pub(crate) fn devices() -> anyhow::Result<()> {
    let device = PlaybackNode::default_device_info()?;
    println!("{}", serde_json::to_string_pretty(&device)?);
    Ok(())
}

pub(crate) fn show_config(init: bool) -> anyhow::Result<()> {
    let path = config::config_path();
    if init && !path.exists() {
        let written = config::save_config(&AppConfig::default())?;
        info!(path = %written.display(), "Wrote default config");
    }

    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&config::load_config())?);
    Ok(())
}
