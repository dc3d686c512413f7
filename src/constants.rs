//! Application-wide constants.
//!
//! This module defines constants used throughout the application,
//! including the application name and the foreground service banner.

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "MorseVibe";

/// The binary name of the application (used in command examples, lowercase).
pub const APP_BINARY_NAME: &str = "morsevibe";

/// Status line announced while the foreground service is running.
pub const SERVICE_STATUS: &str = "Running in background";
