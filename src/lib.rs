//! MorseVibe library
//!
//! Encodes text as International Morse code and plays it back as timed
//! vibration pulses on a [`playback::VibrationDevice`].
//!
//! - [`morse`]: symbol table and encoder
//! - [`playback`]: scheduling, the real-time driver and the single-slot
//!   playback manager
//! - [`config`]: TOML configuration
//! - [`cli`]: command handlers for the `morsevibe` binary
//! - `web`: foreground HTTP service (feature `web`)

// Module declarations
pub mod cli;
pub mod config;
pub mod constants;
pub mod morse;
pub mod playback;

#[cfg(feature = "web")]
pub mod web;
