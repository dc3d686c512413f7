//! Play command: encode text and vibrate it out.

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tracing::{error, info};

use crate::cli::common::{join_text, load_config, print_json, CliError, CliResult};
use crate::config::DeviceKind;
use crate::morse::MorseString;
use crate::playback::device::{self, ConsoleVibrator, VibrationDevice};
use crate::playback::{
    planned_duration, prepare, schedule, CancelToken, PlaybackAction, PlaybackDriver,
    PlaybackOutcome, PlaybackReport, PlaybackTiming,
};

/// Play text as Morse vibration pulses
#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Text to play (words are joined with a single space)
    #[arg(value_name = "TEXT")]
    text: Vec<String>,

    /// Speed between 0.0 (configured timings) and 1.0 (fastest)
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    speed: f32,

    /// Device to drive (console or log), overrides the config file
    #[arg(long, value_name = "DEVICE")]
    device: Option<String>,

    /// Print the playback plan without vibrating
    #[arg(long)]
    dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize, Debug)]
struct PlanOutput<'a> {
    input: &'a str,
    morse: &'a MorseString,
    speed: f32,
    planned_ms: u64,
    actions: &'a [PlaybackAction],
}

#[derive(Serialize, Debug)]
struct PlayOutput<'a> {
    input: &'a str,
    morse: &'a MorseString,
    speed: f32,
    device: &'static str,
    report: &'a PlaybackReport,
}

impl PlayArgs {
    /// Execute the play command
    pub async fn execute(&self, config_path: Option<&Path>) -> CliResult<()> {
        let mut config = load_config(config_path)?;
        if let Some(kind) = &self.device {
            config.device.kind = kind
                .parse::<DeviceKind>()
                .map_err(|e| CliError::validation(e.to_string()))?;
        }

        let input = join_text(&self.text);
        let morse = prepare(&input)?;
        let timing = PlaybackTiming::for_speed(&config.playback, self.speed)?;

        if self.dry_run {
            return self.print_plan(&input, &morse, &timing);
        }

        // JSON goes to stdout, so console pulses are drawn on stderr instead.
        let device: Arc<dyn VibrationDevice> =
            if self.json && config.device.kind == DeviceKind::Console {
                Arc::new(ConsoleVibrator::new(
                    Box::new(io::stderr()),
                    config.device.bell,
                ))
            } else {
                device::from_config(&config.device)
            };
        let device_name = device.name();
        let driver = PlaybackDriver::new(device, timing);

        let (handle, token) = CancelToken::pair();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted");
                handle.cancel();
            }
        });

        let result = driver.play(&morse, token).await;
        interrupt.abort();

        let report = result.map_err(|e| {
            error!(error = %e, "Error during vibration");
            CliError::from(e)
        })?;

        if self.json {
            print_json(&PlayOutput {
                input: &input,
                morse: &morse,
                speed: self.speed,
                device: device_name,
                report: &report,
            })?;
        } else if config.device.kind == DeviceKind::Console {
            println!();
        }

        match report.outcome {
            PlaybackOutcome::Completed => Ok(()),
            PlaybackOutcome::Cancelled => Err(CliError::cancelled(format!(
                "Playback cancelled after {} pulses",
                report.pulses
            ))),
        }
    }

    fn print_plan(
        &self,
        input: &str,
        morse: &MorseString,
        timing: &PlaybackTiming,
    ) -> CliResult<()> {
        let actions = schedule(morse, timing);
        let planned = planned_duration(&actions);

        if self.json {
            return print_json(&PlanOutput {
                input,
                morse,
                speed: self.speed,
                planned_ms: planned.as_millis() as u64,
                actions: &actions,
            });
        }

        println!("Morse: {morse}");
        for action in &actions {
            match action {
                PlaybackAction::Pulse { symbol, waveform } => {
                    println!("  pulse {symbol}  {}", ConsoleVibrator::render(waveform));
                }
                PlaybackAction::Pause { duration, reason } => {
                    println!("  pause {:>6} ms  ({reason:?})", duration.as_millis());
                }
            }
        }
        println!("Total: {} ms", planned.as_millis());
        Ok(())
    }
}
