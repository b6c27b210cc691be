//! Logging utilities
//!
//! Installs `env_logger` as the `log` backend. `RUST_LOG` overrides the
//! default `info` filter.

use std::fs::OpenOptions;
use std::path::Path;

use env_logger::{Builder, Env, Target};

use crate::error::ServerError;

/// Setup logging for the server, writing to `log_file` when given.
pub fn setup_logging(log_file: Option<&Path>) -> Result<(), ServerError> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ServerError::LogFile {
                path: path.to_path_buf(),
                source,
            })?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.try_init()?;
    Ok(())
}
