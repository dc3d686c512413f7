//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// What to do when a playback is requested while another one is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Refuse the new request and leave the running playback alone
    #[default]
    Reject,
    /// Cancel the running playback and start the new one
    Preempt,
}

impl fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::Preempt => write!(f, "preempt"),
        }
    }
}

impl FromStr for OverlapPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "preempt" => Ok(Self::Preempt),
            other => anyhow::bail!("Unknown overlap policy '{other}'. Use reject or preempt"),
        }
    }
}

/// Which vibration output to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Draw pulses in the terminal
    #[default]
    Console,
    /// Emit pulses as log events
    Log,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => write!(f, "console"),
            Self::Log => write!(f, "log"),
        }
    }
}

impl FromStr for DeviceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "log" => Ok(Self::Log),
            other => anyhow::bail!("Unknown device '{other}'. Use console or log"),
        }
    }
}

/// Playback timings and behaviour.
///
/// All durations are in milliseconds and describe playback at speed 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Length of one vibration burst
    pub dot_length_ms: u64,
    /// Off time between the two bursts of a dash
    pub dash_spacing_ms: u64,
    /// Pause after each dot or dash
    pub symbol_gap_ms: u64,
    /// Pause at a letter boundary
    pub letter_gap_ms: u64,
    /// Pause at a word boundary
    pub word_gap_ms: u64,
    /// Vibration amplitude (1-255)
    pub intensity: u8,
    /// Duration multiplier applied at full speed (0 < scale <= 1)
    pub min_speed_scale: f64,
    /// Behaviour when a playback is already running
    pub overlap: OverlapPolicy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            dot_length_ms: 50,
            dash_spacing_ms: 100,
            symbol_gap_ms: 450,
            letter_gap_ms: 900,
            word_gap_ms: 2250,
            intensity: 255,
            min_speed_scale: 0.25,
            overlap: OverlapPolicy::default(),
        }
    }
}

/// Vibration device selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device to drive
    pub kind: DeviceKind,
    /// Ring the terminal bell on every pulse (console device only)
    pub bell: bool,
}

/// Foreground service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3031,
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/MorseVibe/config.toml`
/// - macOS: `~/Library/Application Support/MorseVibe/config.toml`
/// - Windows: `%APPDATA%\MorseVibe\config.toml`
///
/// # Validation
///
/// - `dot_length_ms` must be non-zero
/// - `symbol_gap_ms` must be at least two dot lengths, so a dash has finished
///   before the next pulse starts
/// - `intensity` must be non-zero
/// - `min_speed_scale` must be in `(0, 1]`
/// - `port` must be non-zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Playback timings
    pub playback: PlaybackConfig,
    /// Vibration device
    pub device: DeviceConfig,
    /// Foreground service
    pub service: ServiceConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the platform-specific config directory path.
    ///
    /// - Linux: `~/.config/MorseVibe/`
    /// - macOS: `~/Library/Application Support/MorseVibe/`
    /// - Windows: `%APPDATA%\MorseVibe\`
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("MorseVibe");

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from an explicit path.
    ///
    /// A missing file yields the default configuration; a present but
    /// invalid file is an error.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;

        config.validate().context(format!(
            "Invalid configuration in {}",
            config_path.display()
        ))?;

        Ok(config)
    }

    /// Saves configuration to `config_path` using atomic write.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir).context(format!(
                "Failed to create config directory: {}",
                config_dir.display()
            ))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let temp_path = config_path.with_extension("toml.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        fs::rename(&temp_path, config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        let playback = &self.playback;

        if playback.dot_length_ms == 0 {
            anyhow::bail!("playback.dot_length_ms must be greater than 0");
        }

        let min_symbol_gap = playback.dot_length_ms.checked_mul(2);
        if min_symbol_gap.map_or(true, |min| playback.symbol_gap_ms < min) {
            anyhow::bail!(
                "playback.symbol_gap_ms ({}) must be at least twice playback.dot_length_ms ({}) \
                 or consecutive pulses would overlap",
                playback.symbol_gap_ms,
                playback.dot_length_ms
            );
        }

        if playback.intensity == 0 {
            anyhow::bail!("playback.intensity must be between 1 and 255");
        }

        if !(playback.min_speed_scale > 0.0 && playback.min_speed_scale <= 1.0) {
            anyhow::bail!(
                "playback.min_speed_scale must be greater than 0 and at most 1, got {}",
                playback.min_speed_scale
            );
        }

        if self.service.port == 0 {
            anyhow::bail!("service.port must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert_eq!(config.playback.dot_length_ms, 50);
        assert_eq!(config.playback.dash_spacing_ms, 100);
        assert_eq!(config.playback.symbol_gap_ms, 450);
        // letter and word gaps are 2x and 5x the symbol gap
        assert_eq!(config.playback.letter_gap_ms, config.playback.symbol_gap_ms * 2);
        assert_eq!(config.playback.word_gap_ms, config.playback.symbol_gap_ms * 5);
        assert_eq!(config.playback.intensity, 255);
        assert_eq!(config.playback.overlap, OverlapPolicy::Reject);
        assert_eq!(config.device.kind, DeviceKind::Console);
        assert!(!config.device.bell);
        assert_eq!(config.service.port, 3031);
    }

    #[test]
    fn test_config_validate_default() {
        assert!(Config::new().validate().is_ok());
    }

    #[test]
    fn test_config_validate_rejects_overlapping_pulses() {
        let mut config = Config::new();
        config.playback.symbol_gap_ms = 99;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overlap"));

        config.playback.symbol_gap_ms = 100;
        assert!(config.validate().is_ok());

        config.playback.dot_length_ms = u64::MAX;
        config.playback.symbol_gap_ms = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_config_validate_rejects_bad_values() {
        let mut config = Config::new();
        config.playback.dot_length_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.playback.intensity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.playback.min_speed_scale = 0.0;
        assert!(config.validate().is_err());
        config.playback.min_speed_scale = 1.5;
        assert!(config.validate().is_err());
        config.playback.min_speed_scale = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.service.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::new();
        config.playback.symbol_gap_ms = 300;
        config.playback.overlap = OverlapPolicy::Preempt;
        config.device.kind = DeviceKind::Log;
        config.service.port = 8080;

        config.save_to(&config_file).unwrap();
        assert!(config_file.exists());
        assert!(!config_file.with_extension("toml.tmp").exists());

        let loaded = Config::load_from(&config_file).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Config::load_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_config_load_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        fs::write(
            &config_file,
            "[playback]\nsymbol_gap_ms = 200\noverlap = \"preempt\"\n",
        )
        .unwrap();

        let loaded = Config::load_from(&config_file).unwrap();
        assert_eq!(loaded.playback.symbol_gap_ms, 200);
        assert_eq!(loaded.playback.dot_length_ms, 50);
        assert_eq!(loaded.playback.overlap, OverlapPolicy::Preempt);
        assert_eq!(loaded.service, ServiceConfig::default());
    }

    #[test]
    fn test_config_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        fs::write(&config_file, "[playback\n").unwrap();
        assert!(Config::load_from(&config_file).is_err());

        fs::write(&config_file, "[playback]\ndot_length_ms = 0\n").unwrap();
        let err = Config::load_from(&config_file).unwrap_err();
        assert!(format!("{err:#}").contains("dot_length_ms"));

        fs::write(
            &config_file,
            "[playback]\ndot_length_ms = 9223372036854775807\nsymbol_gap_ms = 9223372036854775807\n",
        )
        .unwrap();
        let err = Config::load_from(&config_file).unwrap_err();
        assert!(format!("{err:#}").contains("symbol_gap_ms"));
    }

    #[test]
    fn test_save_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        let mut config = Config::new();
        config.playback.intensity = 0;
        assert!(config.save_to(&config_file).is_err());
        assert!(!config_file.exists());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Preempt".parse::<OverlapPolicy>().unwrap(), OverlapPolicy::Preempt);
        assert_eq!("reject".parse::<OverlapPolicy>().unwrap(), OverlapPolicy::Reject);
        assert!("queue".parse::<OverlapPolicy>().is_err());

        assert_eq!("LOG".parse::<DeviceKind>().unwrap(), DeviceKind::Log);
        assert_eq!(DeviceKind::Console.to_string(), "console");
        assert!("haptic".parse::<DeviceKind>().is_err());
    }
}
