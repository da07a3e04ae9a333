//! Validated edit parameters (gain, speed, trim window)

use serde::Serialize;

use crate::error::{Result, TapedeckError};

/// A complete, validated set of edit parameters.
///
/// Only constructible through the validating constructors, so any value that
/// exists satisfies `gain > 0`, `speed_factor > 0` and
/// `0 <= trim_start_secs < trim_end_secs <= duration`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EditParameters {
    gain: f32,
    speed_factor: f64,
    trim_start_secs: f64,
    trim_end_secs: f64,
}

impl EditParameters {
    pub fn new(
        gain: f32,
        speed_factor: f64,
        trim_start_secs: f64,
        trim_end_secs: f64,
        duration_secs: f64,
    ) -> Result<Self> {
        let invalid = |msg: String| Err(TapedeckError::InvalidParameters(msg));

        if !gain.is_finite() || gain <= 0.0 {
            return invalid(format!("gain must be a positive number, got {gain}"));
        }
        if !speed_factor.is_finite() || speed_factor <= 0.0 {
            return invalid(format!("speed factor must be a positive number, got {speed_factor}"));
        }
        if !trim_start_secs.is_finite() || !trim_end_secs.is_finite() {
            return invalid("trim bounds must be finite".into());
        }
        if trim_start_secs < 0.0 {
            return invalid(format!("trim start {trim_start_secs} is before the buffer start"));
        }
        if trim_start_secs >= trim_end_secs {
            return invalid(format!(
                "trim start {trim_start_secs} must be before trim end {trim_end_secs}"
            ));
        }
        if trim_end_secs > duration_secs {
            return invalid(format!(
                "trim end {trim_end_secs} is past the buffer duration {duration_secs}"
            ));
        }

        Ok(Self {
            gain,
            speed_factor,
            trim_start_secs,
            trim_end_secs,
        })
    }

    /// Unity gain, normal speed, whole buffer
    pub fn identity(duration_secs: f64) -> Result<Self> {
        Self::new(1.0, 1.0, 0.0, duration_secs, duration_secs)
    }

    /// Build from editor control positions.
    ///
    /// `volume_pct` is 0..=200 (100 = unity), `speed_pct` 50..=200
    /// (100 = normal), trim bounds are percentages of the duration.
    pub fn from_control_percentages(
        volume_pct: u32,
        speed_pct: u32,
        trim_start_pct: u32,
        trim_end_pct: u32,
        duration_secs: f64,
    ) -> Result<Self> {
        if volume_pct > 200 {
            return Err(TapedeckError::InvalidParameters(format!(
                "volume {volume_pct}% is above 200%"
            )));
        }
        if !(50..=200).contains(&speed_pct) {
            return Err(TapedeckError::InvalidParameters(format!(
                "speed {speed_pct}% is outside 50%..200%"
            )));
        }
        if trim_end_pct > 100 {
            return Err(TapedeckError::InvalidParameters(format!(
                "trim end {trim_end_pct}% is above 100%"
            )));
        }

        let trim_end_secs = if trim_end_pct == 100 {
            duration_secs
        } else {
            trim_end_pct as f64 / 100.0 * duration_secs
        };

        Self::new(
            volume_pct as f32 / 100.0,
            speed_pct as f64 / 100.0,
            trim_start_pct as f64 / 100.0 * duration_secs,
            trim_end_secs,
            duration_secs,
        )
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn trim_start_secs(&self) -> f64 {
        self.trim_start_secs
    }

    pub fn trim_end_secs(&self) -> f64 {
        self.trim_end_secs
    }

    /// Length of the trim window in seconds
    pub fn trim_len_secs(&self) -> f64 {
        self.trim_end_secs - self.trim_start_secs
    }
}
