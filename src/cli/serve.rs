//! Serve command: run the foreground playback service.

use std::net::SocketAddr;
use std::path::Path;

use clap::Args;

use crate::cli::common::{load_config, CliError, CliResult};

/// Run the playback service until interrupted
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind to (defaults to the config file value)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (defaults to the config file value)
    #[arg(short, long)]
    port: Option<u16>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(&self, config_path: Option<&Path>) -> CliResult<()> {
        let config = load_config(config_path)?;

        let host = self.host.as_deref().unwrap_or(&config.service.host);
        let port = self.port.unwrap_or(config.service.port);
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| CliError::validation(format!("Invalid address {host}:{port}: {e}")))?;

        crate::web::run_server(config, addr)
            .await
            .map_err(|e| CliError::io(format!("Server error: {e:#}")))
    }
}
