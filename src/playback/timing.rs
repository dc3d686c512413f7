//! Playback durations and speed scaling.

use std::time::Duration;

use crate::config::PlaybackConfig;

use super::PlaybackError;

/// Lowest accepted speed value (configured timings, unscaled).
pub const MIN_SPEED: f32 = 0.0;
/// Highest accepted speed value (timings scaled to `min_speed_scale`).
pub const MAX_SPEED: f32 = 1.0;

/// Concrete durations for one playback, after speed scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackTiming {
    /// Length of each vibration burst.
    pub dot_length: Duration,
    /// Off time between the two bursts of a dash. Also lengthens the pause
    /// after a dash.
    pub dash_spacing: Duration,
    /// Pause after every dot or dash.
    pub symbol_gap: Duration,
    /// Pause at a letter boundary.
    pub letter_gap: Duration,
    /// Pause at a word boundary.
    pub word_gap: Duration,
    /// Amplitude of the "on" segments.
    pub intensity: u8,
}

impl PlaybackTiming {
    /// Builds timings from configuration with no speed scaling.
    #[must_use]
    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self {
            dot_length: Duration::from_millis(config.dot_length_ms),
            dash_spacing: Duration::from_millis(config.dash_spacing_ms),
            symbol_gap: Duration::from_millis(config.symbol_gap_ms),
            letter_gap: Duration::from_millis(config.letter_gap_ms),
            word_gap: Duration::from_millis(config.word_gap_ms),
            intensity: config.intensity,
        }
    }

    /// Builds timings from configuration scaled for a speed slider value.
    ///
    /// `speed` must lie in `[0.0, 1.0]`. At 0 the configured durations are
    /// used as-is; at 1 every duration is multiplied by
    /// `config.min_speed_scale`. Values in between interpolate linearly.
    /// Intensity is never scaled.
    pub fn for_speed(config: &PlaybackConfig, speed: f32) -> Result<Self, PlaybackError> {
        let factor = speed_factor(speed, config.min_speed_scale)?;
        Ok(Self::from_config(config).scaled(factor))
    }

    /// Multiplies every duration by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            dot_length: self.dot_length.mul_f64(factor),
            dash_spacing: self.dash_spacing.mul_f64(factor),
            symbol_gap: self.symbol_gap.mul_f64(factor),
            letter_gap: self.letter_gap.mul_f64(factor),
            word_gap: self.word_gap.mul_f64(factor),
            intensity: self.intensity,
        }
    }

    /// Pause that follows a dash.
    #[must_use]
    pub fn dash_gap(&self) -> Duration {
        self.symbol_gap + self.dash_spacing
    }
}

/// Converts a speed slider value into a duration multiplier.
pub fn speed_factor(speed: f32, min_scale: f64) -> Result<f64, PlaybackError> {
    if !speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
        return Err(PlaybackError::InvalidSpeed(speed));
    }
    Ok(f64::from(speed).mul_add(min_scale - 1.0, 1.0))
}
