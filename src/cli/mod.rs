//! CLI command handlers for MorseVibe.
//!
//! Each subcommand lives in its own module with an `Args` struct and an
//! `execute` method returning [`common::CliResult`].

pub mod common;
pub mod config;
pub mod encode;
pub mod play;
#[cfg(feature = "web")]
pub mod serve;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode};
pub use config::ConfigArgs;
pub use encode::EncodeArgs;
pub use play::PlayArgs;
#[cfg(feature = "web")]
pub use serve::ServeArgs;
