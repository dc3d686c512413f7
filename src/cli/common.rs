//! Shared CLI plumbing: error type, exit codes and output helpers.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::playback::PlaybackError;

/// Process exit codes used by all commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed
    Success = 0,
    /// Bad input or configuration
    ValidationError = 1,
    /// File, device or network failure
    IoError = 2,
    /// Interrupted by the user
    Cancelled = 130,
}

impl ExitCode {
    /// Numeric process exit code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Error returned by CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    /// Exit code the process should end with
    pub kind: ExitCode,
    /// Message printed to stderr
    pub message: String,
}

impl CliError {
    /// Bad input or configuration.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::ValidationError,
            message: message.into(),
        }
    }

    /// File, device or network failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::IoError,
            message: message.into(),
        }
    }

    /// Interrupted by the user.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::Cancelled,
            message: message.into(),
        }
    }

    /// Numeric process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.kind.code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<PlaybackError> for CliError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::Device { .. } => Self::io(err.to_string()),
            _ => Self::validation(err.to_string()),
        }
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Resolves the config file: `--config` if given, else the platform default.
pub fn config_path(explicit: Option<&Path>) -> CliResult<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_file_path()
            .map_err(|e| CliError::io(format!("Failed to locate configuration: {e}"))),
    }
}

/// Loads the configuration from `--config` or the platform default.
pub fn load_config(explicit: Option<&Path>) -> CliResult<Config> {
    let path = config_path(explicit)?;
    Config::load_from(&path)
        .map_err(|e| CliError::validation(format!("Failed to load configuration: {e:#}")))
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Joins the positional words of a command into one message.
///
/// Each word keeps its own content; words are separated by one space.
pub fn join_text(words: &[String]) -> String {
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::DeviceError;
    use tempfile::TempDir;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(CliError::validation("x").exit_code(), 1);
        assert_eq!(CliError::io("x").exit_code(), 2);
        assert_eq!(CliError::cancelled("x").exit_code(), 130);
    }

    #[test]
    fn test_playback_error_mapping() {
        let err = CliError::from(PlaybackError::EmptyInput);
        assert_eq!(err.kind, ExitCode::ValidationError);
        assert_eq!(err.message, "Please enter some text");

        let err = CliError::from(PlaybackError::Device {
            error: DeviceError::new("gone"),
            pulses_played: 3,
        });
        assert_eq!(err.kind, ExitCode::IoError);
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_invalid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[playback]\ndot_length_ms = 0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert_eq!(err.kind, ExitCode::ValidationError);
        assert!(err.message.contains("dot_length_ms"));
    }

    #[test]
    fn test_join_text() {
        assert_eq!(join_text(&["hello".into(), "world".into()]), "hello world");
        assert_eq!(join_text(&[]), "");
    }
}
