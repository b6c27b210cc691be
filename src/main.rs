//! RAX FTP Server - Entry Point
//!
//! A Rust-based FTP server implementing core features of RFC 959.

use std::process::ExitCode;

use log::{error, info};

use rax_ftpd::error::ServerError;
use rax_ftpd::utils::setup_logging;
use rax_ftpd::{Server, ServerConfig, ServerContext};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = setup_logging(config.log_file.as_deref()) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    info!("Launching FTP server...");

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server startup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let context = ServerContext::from_config(&config)?;
    let server = Server::bind(&config, context).await?;
    server.run().await;
    Ok(())
}
