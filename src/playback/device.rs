//! Vibration devices.
//!
//! A [`VibrationDevice`] accepts whole [`Waveform`]s and plays them in the
//! background; `vibrate` returns as soon as the waveform has been handed
//! over. The playback driver owns the device for the duration of a playback
//! and is responsible for spacing calls so waveforms never overlap.
//!
//! Host builds ship two real devices:
//! - [`ConsoleVibrator`] draws each waveform to a terminal as it is issued
//! - [`LogVibrator`] emits one `tracing` event per waveform
//!
//! [`MockVibrator`] records what it was asked to play and can be told to fail,
//! for tests.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use crate::config::{DeviceConfig, DeviceKind};

use super::waveform::Waveform;

/// Failure reported by a vibration device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceError {
    /// Human readable description.
    pub message: String,
}

impl DeviceError {
    /// Creates a device error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DeviceError {}

impl From<io::Error> for DeviceError {
    fn from(err: io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Trait for haptic outputs, allowing mock injection for tests.
pub trait VibrationDevice: Send + Sync {
    /// Starts playing a waveform. Fire-and-forget: must not block for the
    /// waveform's duration.
    fn vibrate(&self, waveform: &Waveform) -> Result<(), DeviceError>;

    /// Stops whatever is currently playing. Default is a no-op for devices
    /// that cannot interrupt a waveform.
    fn cancel(&self) {}

    /// Short identifier used in logs and API responses.
    fn name(&self) -> &'static str;
}

/// Creates the device selected in configuration.
#[must_use]
pub fn from_config(config: &DeviceConfig) -> Arc<dyn VibrationDevice> {
    match config.kind {
        DeviceKind::Console => Arc::new(ConsoleVibrator::stdout(config.bell)),
        DeviceKind::Log => Arc::new(LogVibrator),
    }
}

/// Width in characters of one rendered time slice.
const CONSOLE_SLICE: Duration = Duration::from_millis(25);

/// Renders waveforms to a terminal.
///
/// Each "on" segment is drawn as a run of `#`, each "off" segment inside the
/// waveform as spaces, one character per 25 ms (at least one). Waveforms are
/// separated by a single space and flushed immediately so output appears in
/// step with playback.
pub struct ConsoleVibrator {
    out: Mutex<Box<dyn Write + Send>>,
    bell: bool,
}

impl ConsoleVibrator {
    /// Console device writing to stdout.
    #[must_use]
    pub fn stdout(bell: bool) -> Self {
        Self::new(Box::new(io::stdout()), bell)
    }

    /// Console device writing to an arbitrary writer.
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>, bell: bool) -> Self {
        Self {
            out: Mutex::new(out),
            bell,
        }
    }

    /// Text drawn for one waveform (without the trailing separator).
    #[must_use]
    pub fn render(waveform: &Waveform) -> String {
        let mut line = String::new();
        for (duration, amplitude) in waveform.segments() {
            if duration.is_zero() {
                continue;
            }
            let width = (duration.as_millis() / CONSOLE_SLICE.as_millis()).max(1) as usize;
            let glyph = if amplitude > 0 { '#' } else { ' ' };
            line.extend(std::iter::repeat(glyph).take(width));
        }
        line
    }
}

impl VibrationDevice for ConsoleVibrator {
    fn vibrate(&self, waveform: &Waveform) -> Result<(), DeviceError> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| DeviceError::new("console output lock poisoned"))?;
        if self.bell {
            out.write_all(b"\x07")?;
        }
        write!(out, "{} ", Self::render(waveform))?;
        out.flush()?;
        Ok(())
    }

    fn cancel(&self) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out);
            let _ = out.flush();
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// Reports every waveform as a `tracing` event and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogVibrator;

impl VibrationDevice for LogVibrator {
    fn vibrate(&self, waveform: &Waveform) -> Result<(), DeviceError> {
        info!(
            on_ms = waveform.on_duration().as_millis() as u64,
            total_ms = waveform.total_duration().as_millis() as u64,
            amplitude = waveform.amplitudes.iter().copied().max().unwrap_or(0),
            "Vibrate"
        );
        Ok(())
    }

    fn cancel(&self) {
        info!("Vibration cancelled");
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// A waveform recorded by [`MockVibrator`].
#[derive(Debug, Clone)]
pub struct RecordedPulse {
    /// When `vibrate` was called, on the tokio clock.
    pub at: Instant,
    /// What was played.
    pub waveform: Waveform,
}

#[derive(Debug, Default)]
struct MockState {
    pulses: Vec<RecordedPulse>,
    cancels: usize,
}

/// Mock vibration device for testing.
#[derive(Debug, Default)]
pub struct MockVibrator {
    state: Mutex<MockState>,
    /// 1-based index of the `vibrate` call that should fail.
    pub fail_on: Option<usize>,
}

impl MockVibrator {
    /// Mock that accepts every waveform.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock whose `n`-th `vibrate` call fails (1-based).
    #[must_use]
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Self::default()
        }
    }

    /// Snapshot of the recorded pulses.
    #[must_use]
    pub fn pulses(&self) -> Vec<RecordedPulse> {
        self.state
            .lock()
            .map(|s| s.pulses.clone())
            .unwrap_or_default()
    }

    /// Number of `cancel` calls received.
    #[must_use]
    pub fn cancel_count(&self) -> usize {
        self.state.lock().map(|s| s.cancels).unwrap_or_default()
    }
}

impl VibrationDevice for MockVibrator {
    fn vibrate(&self, waveform: &Waveform) -> Result<(), DeviceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DeviceError::new("mock state lock poisoned"))?;
        let attempt = state.pulses.len() + 1;
        if self.fail_on == Some(attempt) {
            return Err(DeviceError::new(format!("mock failure on pulse {attempt}")));
        }
        state.pulses.push(RecordedPulse {
            at: Instant::now(),
            waveform: waveform.clone(),
        });
        Ok(())
    }

    fn cancel(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.cancels += 1;
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
