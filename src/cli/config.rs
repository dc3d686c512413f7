//! Configuration management CLI commands.

use std::path::Path;

use clap::{Args, Subcommand};

use crate::cli::common::{config_path, load_config, print_json, CliError, CliResult};
use crate::config::{Config, DeviceKind, OverlapPolicy};

/// Configuration management commands
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Display current configuration
    Show(ConfigShowArgs),
    /// Set configuration values
    Set(ConfigSetArgs),
    /// Print the configuration file location
    Path,
}

/// Display current configuration
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set configuration values
#[derive(Args, Debug, Default)]
pub struct ConfigSetArgs {
    /// Length of one vibration burst in milliseconds
    #[arg(long, value_name = "MS")]
    dot_length: Option<u64>,

    /// Off time inside a dash in milliseconds
    #[arg(long, value_name = "MS")]
    dash_spacing: Option<u64>,

    /// Pause after each dot or dash in milliseconds
    #[arg(long, value_name = "MS")]
    symbol_gap: Option<u64>,

    /// Pause between letters in milliseconds
    #[arg(long, value_name = "MS")]
    letter_gap: Option<u64>,

    /// Pause between words in milliseconds
    #[arg(long, value_name = "MS")]
    word_gap: Option<u64>,

    /// Vibration amplitude (1-255)
    #[arg(long, value_name = "LEVEL")]
    intensity: Option<u8>,

    /// Duration multiplier at full speed (0 < scale <= 1)
    #[arg(long, value_name = "SCALE")]
    min_speed_scale: Option<f64>,

    /// What to do when a playback is already running (reject or preempt)
    #[arg(long, value_name = "POLICY")]
    overlap: Option<String>,

    /// Vibration device (console or log)
    #[arg(long, value_name = "DEVICE")]
    device: Option<String>,

    /// Ring the terminal bell on every pulse (true or false)
    #[arg(long, value_name = "BOOL")]
    bell: Option<bool>,

    /// Service bind address
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Service port
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self, config_file: Option<&Path>) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(config_file),
            ConfigCommand::Set(args) => args.execute(config_file),
            ConfigCommand::Path => {
                println!("{}", config_path(config_file)?.display());
                Ok(())
            }
        }
    }
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self, config_file: Option<&Path>) -> CliResult<()> {
        let config = load_config(config_file)?;

        if self.json {
            print_json(&config)
        } else {
            output_human_readable(&config);
            Ok(())
        }
    }
}

impl ConfigSetArgs {
    /// Execute set command
    pub fn execute(&self, config_file: Option<&Path>) -> CliResult<()> {
        let path = config_path(config_file)?;
        let mut config = load_config(Some(&path))?;

        if !self.apply(&mut config)? {
            return Err(CliError::validation(
                "At least one configuration option must be specified (see `config set --help`)",
            ));
        }

        config
            .validate()
            .map_err(|e| CliError::validation(format!("Invalid configuration: {e}")))?;

        config
            .save_to(&path)
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        println!("Configuration updated successfully.");

        Ok(())
    }

    /// Copies every given option into `config`. Returns whether any was given.
    fn apply(&self, config: &mut Config) -> CliResult<bool> {
        let mut changed = false;
        let playback = &mut config.playback;

        for (value, field) in [
            (self.dot_length, &mut playback.dot_length_ms),
            (self.dash_spacing, &mut playback.dash_spacing_ms),
            (self.symbol_gap, &mut playback.symbol_gap_ms),
            (self.letter_gap, &mut playback.letter_gap_ms),
            (self.word_gap, &mut playback.word_gap_ms),
        ] {
            if let Some(ms) = value {
                *field = ms;
                changed = true;
            }
        }

        if let Some(intensity) = self.intensity {
            playback.intensity = intensity;
            changed = true;
        }

        if let Some(scale) = self.min_speed_scale {
            playback.min_speed_scale = scale;
            changed = true;
        }

        if let Some(policy) = &self.overlap {
            playback.overlap = policy
                .parse::<OverlapPolicy>()
                .map_err(|e| CliError::validation(e.to_string()))?;
            changed = true;
        }

        if let Some(kind) = &self.device {
            config.device.kind = kind
                .parse::<DeviceKind>()
                .map_err(|e| CliError::validation(e.to_string()))?;
            changed = true;
        }

        if let Some(bell) = self.bell {
            config.device.bell = bell;
            changed = true;
        }

        if let Some(host) = &self.host {
            config.service.host.clone_from(host);
            changed = true;
        }

        if let Some(port) = self.port {
            config.service.port = port;
            changed = true;
        }

        Ok(changed)
    }
}

/// Output configuration in human-readable format
fn output_human_readable(config: &Config) {
    let playback = &config.playback;

    println!("MorseVibe Configuration");
    println!("=======================");
    println!();

    println!("Playback:");
    println!("  Dot Length:      {} ms", playback.dot_length_ms);
    println!("  Dash Spacing:    {} ms", playback.dash_spacing_ms);
    println!("  Symbol Gap:      {} ms", playback.symbol_gap_ms);
    println!("  Letter Gap:      {} ms", playback.letter_gap_ms);
    println!("  Word Gap:        {} ms", playback.word_gap_ms);
    println!("  Intensity:       {}", playback.intensity);
    println!("  Min Speed Scale: {}", playback.min_speed_scale);
    println!("  Overlap:         {}", playback.overlap);
    println!();

    println!("Device:");
    println!("  Kind: {}", config.device.kind);
    println!("  Bell: {}", config.device.bell);
    println!();

    println!("Service:");
    println!("  Address: {}:{}", config.service.host, config.service.port);
    println!();
}
