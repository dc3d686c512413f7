//! Shared helpers for MorseVibe integration tests.
#![allow(dead_code)] // Each test binary uses a different subset

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

use morsevibe::config::{Config, PlaybackConfig};

/// Path to the morsevibe binary
pub fn morsevibe_bin() -> &'static str {
    env!("CARGO_BIN_EXE_morsevibe")
}

/// Temp directory plus the config file path inside it (not created).
pub fn temp_config_path() -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    (path, temp_dir)
}

/// Writes `config` to a fresh temp directory.
pub fn write_config(config: &Config) -> (PathBuf, TempDir) {
    let (path, temp_dir) = temp_config_path();
    config.save_to(&path).expect("Failed to write config");
    (path, temp_dir)
}

/// Playback timings short enough for real-time tests.
pub fn fast_playback() -> PlaybackConfig {
    PlaybackConfig {
        dot_length_ms: 2,
        dash_spacing_ms: 4,
        symbol_gap_ms: 5,
        letter_gap_ms: 10,
        word_gap_ms: 20,
        ..PlaybackConfig::default()
    }
}

/// Config using [`fast_playback`] and the log device.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.playback = fast_playback();
    config.device.kind = morsevibe::config::DeviceKind::Log;
    config
}

/// Runs the binary with `--config <path>` and the given arguments.
pub fn run_with_config(config_path: &Path, args: &[&str]) -> Output {
    Command::new(morsevibe_bin())
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

/// Parses stdout as JSON, failing with the captured stderr.
pub fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}). stdout: {} stderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}
