//! Transport state and controls

use serde::{Deserialize, Serialize};

use crate::buffer::SampleBuffer;
use crate::clock::ClockSource;
use crate::error::{Result, TapedeckError};

/// Transport playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Result of a host tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportTick {
    /// Position observed on this tick, in seconds
    pub position_secs: f64,
    /// Playback ran to the end; the transport has been stopped and rewound
    pub reached_end: bool,
}

/// Logical playback position tracked against a clock.
///
/// The transport never produces sound and never schedules itself. The host
/// calls [`Transport::current_position`] or [`Transport::poll`] on its own
/// cadence and drives a playback node from the result.
#[derive(Debug)]
pub struct Transport<C: ClockSource> {
    clock: C,
    state: TransportState,
    /// Offset into the buffer when playback last started or paused
    paused_at_secs: f64,
    /// Clock reading when playback last started; set only while playing
    playback_start_clock: Option<f64>,
    /// `None` when no buffer is attached
    duration_secs: Option<f64>,
}

impl<C: ClockSource> Transport<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: TransportState::Stopped,
            paused_at_secs: 0.0,
            playback_start_clock: None,
            duration_secs: None,
        }
    }

    /// Attach a buffer, resetting to stopped at position 0
    pub fn attach(&mut self, buffer: &SampleBuffer) {
        self.attach_duration(buffer.duration_secs());
    }

    /// Attach by duration only
    pub fn attach_duration(&mut self, duration_secs: f64) {
        let duration = if duration_secs.is_finite() { duration_secs.max(0.0) } else { 0.0 };
        self.duration_secs = Some(duration);
        self.reset();
    }

    pub fn detach(&mut self) {
        self.duration_secs = None;
        self.reset();
    }

    fn reset(&mut self) {
        self.state = TransportState::Stopped;
        self.paused_at_secs = 0.0;
        self.playback_start_clock = None;
    }

    pub fn has_buffer(&self) -> bool {
        self.duration_secs.is_some()
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// Duration of the attached buffer, 0 when none is attached
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs.unwrap_or(0.0)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Start or resume playback; no-op without a buffer or while playing
    pub fn play(&mut self) {
        let _ = self.try_play();
    }

    /// Start or resume playback, reporting a missing buffer
    pub fn try_play(&mut self) -> Result<()> {
        if !self.has_buffer() {
            return Err(TapedeckError::EmptyBuffer);
        }
        if self.is_playing() {
            return Ok(());
        }
        self.playback_start_clock = Some(self.clock.now_secs());
        self.state = TransportState::Playing;
        Ok(())
    }

    /// Freeze the position; no-op unless playing
    pub fn pause(&mut self) {
        if !self.is_playing() {
            return;
        }
        self.paused_at_secs = self.running_position();
        self.playback_start_clock = None;
        self.state = TransportState::Paused;
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Stop and rewind to the start
    pub fn stop(&mut self) {
        if !self.has_buffer() {
            return;
        }
        self.reset();
    }

    /// Move to `target_secs`, clamped to the buffer.
    ///
    /// While playing, the reference instant restarts at the current clock
    /// reading so playback continues from exactly the new position.
    pub fn seek(&mut self, target_secs: f64) {
        let Some(duration) = self.duration_secs else { return };
        let target = if target_secs.is_finite() { target_secs } else { 0.0 };
        self.paused_at_secs = target.clamp(0.0, duration);

        if self.is_playing() {
            self.playback_start_clock = Some(self.clock.now_secs());
        }
    }

    /// Seek to a fraction of the duration (progress-bar click)
    pub fn seek_fraction(&mut self, fraction: f64) {
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        self.seek(fraction * self.duration_secs());
    }

    /// Current position in seconds, clamped to the duration
    pub fn current_position(&self) -> f64 {
        if self.is_playing() {
            self.running_position()
        } else {
            self.paused_at_secs
        }
    }

    /// Position as a fraction of the duration
    pub fn progress_fraction(&self) -> f64 {
        let duration = self.duration_secs();
        if duration <= 0.0 {
            return 0.0;
        }
        self.current_position() / duration
    }

    /// Whether a playing transport has reached the end of the buffer
    pub fn is_at_end(&self) -> bool {
        self.is_playing() && self.current_position() >= self.duration_secs()
    }

    /// Host tick: read the position and stop at end of buffer.
    pub fn poll(&mut self) -> TransportTick {
        if self.is_at_end() {
            let position_secs = self.duration_secs();
            self.stop();
            return TransportTick { position_secs, reached_end: true };
        }
        TransportTick {
            position_secs: self.current_position(),
            reached_end: false,
        }
    }

    fn running_position(&self) -> f64 {
        let Some(start) = self.playback_start_clock else {
            return self.paused_at_secs;
        };
        let elapsed = self.clock.now_secs() - start;
        (self.paused_at_secs + elapsed).clamp(0.0, self.duration_secs())
    }
}

/// Format seconds as `m:ss`
pub fn format_time(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    let mins = (secs / 60.0).floor() as u64;
    let secs_rem = (secs % 60.0).floor() as u64;
    format!("{}:{:02}", mins, secs_rem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn transport_with(duration: f64) -> (ManualClock, Transport<ManualClock>) {
        let clock = ManualClock::new();
        clock.set(100.0);
        let mut transport = Transport::new(clock.clone());
        transport.attach_duration(duration);
        (clock, transport)
    }

    #[test]
    fn test_play_tracks_elapsed_time() {
        let (clock, mut transport) = transport_with(10.0);
        transport.play();
        clock.advance(2.5);
        assert!((transport.current_position() - 2.5).abs() < 1e-9);
        assert_eq!(transport.state(), TransportState::Playing);
    }

    #[test]
    fn test_pause_then_play_resumes() {
        let (clock, mut transport) = transport_with(10.0);
        transport.play();
        clock.advance(3.0);
        transport.pause();
        assert_eq!(transport.state(), TransportState::Paused);

        // Time passing while paused does not move the position
        clock.advance(5.0);
        assert!((transport.current_position() - 3.0).abs() < 1e-9);

        transport.play();
        clock.advance(1.0);
        assert!((transport.current_position() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_seek_clamps() {
        let (_clock, mut transport) = transport_with(10.0);
        transport.seek(-5.0);
        assert_eq!(transport.current_position(), 0.0);
        transport.seek(50.0);
        assert_eq!(transport.current_position(), 10.0);
        transport.seek(f64::NAN);
        assert_eq!(transport.current_position(), 0.0);
    }

    #[test]
    fn test_seek_while_playing_restarts_reference() {
        let (clock, mut transport) = transport_with(10.0);
        transport.play();
        clock.advance(4.0);
        transport.seek(1.0);
        assert_eq!(transport.current_position(), 1.0);

        clock.advance(0.5);
        assert!((transport.current_position() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_position_clamps_at_duration() {
        let (clock, mut transport) = transport_with(2.0);
        transport.play();
        clock.advance(5.0);
        assert_eq!(transport.current_position(), 2.0);
        assert!(transport.is_at_end());

        transport.pause();
        assert_eq!(transport.current_position(), 2.0);
    }

    #[test]
    fn test_poll_stops_and_rewinds_at_end() {
        let (clock, mut transport) = transport_with(2.0);
        transport.play();
        clock.advance(1.0);
        let tick = transport.poll();
        assert!(!tick.reached_end);
        assert!((tick.position_secs - 1.0).abs() < 1e-9);

        clock.advance(1.5);
        let tick = transport.poll();
        assert!(tick.reached_end);
        assert_eq!(tick.position_secs, 2.0);
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.current_position(), 0.0);
    }

    #[test]
    fn test_no_buffer_is_noop() {
        let clock = ManualClock::new();
        let mut transport = Transport::new(clock.clone());

        transport.play();
        assert_eq!(transport.state(), TransportState::Stopped);
        assert!(matches!(transport.try_play(), Err(TapedeckError::EmptyBuffer)));

        transport.seek(3.0);
        transport.pause();
        clock.advance(1.0);
        assert_eq!(transport.current_position(), 0.0);
    }

    #[test]
    fn test_attach_resets_state() {
        let (clock, mut transport) = transport_with(10.0);
        transport.play();
        clock.advance(2.0);

        transport.attach_duration(4.0);
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.current_position(), 0.0);
        assert_eq!(transport.duration_secs(), 4.0);
    }

    #[test]
    fn test_toggle_and_seek_fraction() {
        let (clock, mut transport) = transport_with(8.0);
        transport.seek_fraction(0.25);
        assert_eq!(transport.current_position(), 2.0);
        assert!((transport.progress_fraction() - 0.25).abs() < 1e-9);

        transport.toggle();
        assert!(transport.is_playing());
        clock.advance(1.0);
        transport.toggle();
        assert_eq!(transport.state(), TransportState::Paused);
        assert!((transport.current_position() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(7.9), "0:07");
        assert_eq!(format_time(125.0), "2:05");
        assert_eq!(format_time(-3.0), "0:00");
    }
}
