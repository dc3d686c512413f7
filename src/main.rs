//! MorseVibe - turn text into Morse vibration pulses.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use morsevibe::cli::{self, CliResult, ExitCode};
use morsevibe::constants::APP_BINARY_NAME;

/// MorseVibe - encode text as Morse code and play it as vibration pulses
#[derive(Parser, Debug)]
#[command(name = APP_BINARY_NAME, author, version, about, long_about = None)]
struct Cli {
    /// Use this configuration file instead of the platform default
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode text into Morse without playing it
    Encode(cli::EncodeArgs),
    /// Play text as Morse vibration pulses
    Play(cli::PlayArgs),
    /// Run the playback service until interrupted
    #[cfg(feature = "web")]
    Serve(cli::ServeArgs),
    /// Show or change configuration
    Config(cli::ConfigArgs),
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = cli.config.as_deref();
    match cli.command {
        Command::Encode(args) => args.execute(),
        Command::Play(args) => args.execute(config).await,
        #[cfg(feature = "web")]
        Command::Serve(args) => args.execute(config).await,
        Command::Config(args) => args.execute(config),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let code = match run(cli).await {
        Ok(()) => ExitCode::Success.code(),
        Err(err) => {
            eprintln!("Error: {err}");
            err.exit_code()
        }
    };

    std::process::exit(code);
}
