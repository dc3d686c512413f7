//! Haptic playback of Morse messages.
//!
//! ## Design
//!
//! Playback is split in two steps:
//! - [`schedule`] turns a [`MorseString`] into a flat list of
//!   [`PlaybackAction`]s (pulse or pause). It is pure and needs no clock.
//! - [`PlaybackDriver`] walks that list in real time, handing pulses to a
//!   [`VibrationDevice`] and awaiting `tokio::time::sleep` for pauses.
//!
//! Every pause races a [`CancelToken`], so a playback can be stopped between
//! any two actions. Pulses are fire-and-forget; the pause that follows each
//! one is at least as long as the waveform, so pulses never overlap.
//!
//! [`manager::PlaybackManager`] adds the single "current playback" slot on
//! top of the driver.

pub mod device;
pub mod manager;
mod timing;
mod waveform;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::morse::{encode, MorseString, Token};

pub use device::{DeviceError, VibrationDevice};
pub use timing::{speed_factor, PlaybackTiming, MAX_SPEED, MIN_SPEED};
pub use waveform::Waveform;

/// Errors that stop a playback from starting or finishing.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// The input text was empty.
    EmptyInput,
    /// The input contained no character with a Morse token.
    NothingToPlay,
    /// Speed outside `[MIN_SPEED, MAX_SPEED]` or not a number.
    InvalidSpeed(f32),
    /// Another playback holds the slot.
    Busy {
        /// Id of the playback currently running.
        active: String,
    },
    /// The vibration device rejected a waveform.
    Device {
        /// What the device reported.
        error: DeviceError,
        /// Pulses played before the failure.
        pulses_played: usize,
    },
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Please enter some text"),
            Self::NothingToPlay => write!(
                f,
                "Nothing to play: the text has no characters that can be sent in Morse"
            ),
            Self::InvalidSpeed(speed) => write!(
                f,
                "Invalid speed {speed}: expected a value between {MIN_SPEED} and {MAX_SPEED}"
            ),
            Self::Busy { active } => write!(f, "Playback {active} is already running"),
            Self::Device { error, .. } => write!(f, "Vibration device error: {error}"),
        }
    }
}

impl std::error::Error for PlaybackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Device { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Why a pause is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    /// Settle time after a dot or dash.
    AfterSymbol,
    /// Letter boundary.
    Letter,
    /// Word boundary.
    Word,
}

/// One step of a playback plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlaybackAction {
    /// Hand a waveform to the device.
    Pulse {
        /// Token that produced the pulse (`.` or `-`).
        symbol: char,
        /// Waveform to play.
        waveform: Waveform,
    },
    /// Wait.
    Pause {
        /// How long.
        #[serde(serialize_with = "serialize_duration_ms")]
        duration: Duration,
        /// Why.
        reason: PauseReason,
    },
}

fn serialize_duration_ms<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Encodes `text` for playback, refusing text that would not vibrate.
///
/// Whitespace-only text is accepted: it plays as word gaps.
pub fn prepare(text: &str) -> Result<MorseString, PlaybackError> {
    if text.is_empty() {
        return Err(PlaybackError::EmptyInput);
    }
    let morse = encode(text);
    if morse.is_empty() {
        return Err(PlaybackError::NothingToPlay);
    }
    Ok(morse)
}

/// Plans the actions needed to play `morse` with `timing`.
///
/// - `.` → dot pulse, then the symbol gap
/// - `-` → dash pulse, then the symbol gap plus the dash spacing
/// - ` ` → letter gap
/// - `/` → word gap
#[must_use]
pub fn schedule(morse: &MorseString, timing: &PlaybackTiming) -> Vec<PlaybackAction> {
    let mut actions = Vec::new();
    for token in morse.tokens() {
        match token {
            Token::Dot => {
                actions.push(PlaybackAction::Pulse {
                    symbol: '.',
                    waveform: Waveform::dot(timing),
                });
                actions.push(PlaybackAction::Pause {
                    duration: timing.symbol_gap,
                    reason: PauseReason::AfterSymbol,
                });
            }
            Token::Dash => {
                actions.push(PlaybackAction::Pulse {
                    symbol: '-',
                    waveform: Waveform::dash(timing),
                });
                actions.push(PlaybackAction::Pause {
                    duration: timing.dash_gap(),
                    reason: PauseReason::AfterSymbol,
                });
            }
            Token::LetterGap => actions.push(PlaybackAction::Pause {
                duration: timing.letter_gap,
                reason: PauseReason::Letter,
            }),
            Token::WordGap => actions.push(PlaybackAction::Pause {
                duration: timing.word_gap,
                reason: PauseReason::Word,
            }),
        }
    }
    actions
}

/// Total wall time a plan takes to play.
#[must_use]
pub fn planned_duration(actions: &[PlaybackAction]) -> Duration {
    actions
        .iter()
        .map(|action| match action {
            PlaybackAction::Pause { duration, .. } => *duration,
            PlaybackAction::Pulse { .. } => Duration::ZERO,
        })
        .sum()
}

/// Requests cancellation of a running playback.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<watch::Sender<bool>>);

impl CancelHandle {
    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    /// True once `cancel` was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }
}

/// Observed by the driver; resolves once the paired handle cancels.
#[derive(Debug, Clone)]
pub struct CancelToken(watch::Receiver<bool>);

impl CancelToken {
    /// Creates a connected handle/token pair.
    #[must_use]
    pub fn pair() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle(Arc::new(tx)), Self(rx))
    }

    /// A token that never fires.
    #[must_use]
    pub fn never() -> Self {
        Self::pair().1
    }

    /// True once the paired handle cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Waits until cancelled. Pends forever if the handle is dropped
    /// without cancelling.
    pub async fn cancelled(&mut self) {
        if self.0.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// How a playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackOutcome {
    /// Every action was performed.
    Completed,
    /// Stopped early by a cancel request.
    Cancelled,
}

/// Summary of a finished playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackReport {
    /// Pulses handed to the device.
    pub pulses: usize,
    /// Pauses fully waited out.
    pub pauses: usize,
    /// Wall time spent.
    #[serde(serialize_with = "serialize_duration_ms")]
    pub elapsed: Duration,
    /// How it ended.
    pub outcome: PlaybackOutcome,
}

/// Plays Morse strings on a vibration device.
pub struct PlaybackDriver {
    device: Arc<dyn VibrationDevice>,
    timing: PlaybackTiming,
}

impl PlaybackDriver {
    /// Creates a driver for one device and one set of timings.
    pub fn new(device: Arc<dyn VibrationDevice>, timing: PlaybackTiming) -> Self {
        Self { device, timing }
    }

    /// Plays `morse` in real time.
    ///
    /// Returns once the last pause has elapsed, or early with
    /// [`PlaybackOutcome::Cancelled`] when `cancel` fires; in that case the
    /// device is told to stop. A device error aborts playback and is returned
    /// as [`PlaybackError::Device`] along with the pulses already played.
    pub async fn play(
        &self,
        morse: &MorseString,
        mut cancel: CancelToken,
    ) -> Result<PlaybackReport, PlaybackError> {
        let started = Instant::now();
        let mut report = PlaybackReport {
            pulses: 0,
            pauses: 0,
            elapsed: Duration::ZERO,
            outcome: PlaybackOutcome::Completed,
        };

        info!(device = self.device.name(), morse = %morse, "Starting vibration");

        for action in schedule(morse, &self.timing) {
            if cancel.is_cancelled() {
                return Ok(self.stop(report, started));
            }

            match action {
                PlaybackAction::Pulse { symbol, waveform } => {
                    trace!(%symbol, "Pulse");
                    self.device
                        .vibrate(&waveform)
                        .map_err(|error| PlaybackError::Device {
                            error,
                            pulses_played: report.pulses,
                        })?;
                    report.pulses += 1;
                }
                PlaybackAction::Pause { duration, reason } => {
                    match reason {
                        PauseReason::Letter => debug!("Pausing between letters"),
                        PauseReason::Word => debug!("Pausing between words"),
                        PauseReason::AfterSymbol => {}
                    }
                    tokio::select! {
                        () = tokio::time::sleep(duration) => report.pauses += 1,
                        () = cancel.cancelled() => return Ok(self.stop(report, started)),
                    }
                }
            }
        }

        report.elapsed = started.elapsed();
        info!(
            pulses = report.pulses,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Vibration complete"
        );
        Ok(report)
    }

    fn stop(&self, mut report: PlaybackReport, started: Instant) -> PlaybackReport {
        self.device.cancel();
        report.elapsed = started.elapsed();
        report.outcome = PlaybackOutcome::Cancelled;
        info!(pulses = report.pulses, "Vibration cancelled");
        report
    }
}
