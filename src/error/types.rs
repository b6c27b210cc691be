//! Error types
//!
//! Defines domain-specific error types for each module of the FTP server.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Authentication module errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to read credential file {path}: {source}")]
    CredentialFile { path: PathBuf, source: io::Error },
}

/// Path resolution and containment errors
#[derive(Debug, Error)]
pub enum PathError {
    #[error("cannot resolve {path}: {source}")]
    Unresolvable { path: String, source: io::Error },
    #[error("path escapes the server root: {0}")]
    OutsideRoot(PathBuf),
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("is a directory: {0}")]
    IsADirectory(PathBuf),
}

/// Transfer module errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("no passive data connection pending")]
    DataChannelNotInitialized,
    #[error("no available port in {first}-{last}")]
    NoAvailablePort { first: u16, last: u16 },
    #[error("failed to configure data listener: {0}")]
    ListenerConfigurationFailed(io::Error),
    #[error("timed out waiting for data connection on port {0}")]
    ConnectionTimeout(u16),
    #[error("failed to accept data connection on port {port}: {source}")]
    AcceptFailed { port: u16, source: io::Error },
    #[error("data connection failed: {0}")]
    TransferFailed(io::Error),
    #[error("local file error: {0}")]
    LocalFile(io::Error),
    #[error("upload already in progress: {0}")]
    UploadInProgress(PathBuf),
}

/// Startup errors. Every variant is fatal to the process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("server root {path} is unusable: {source}")]
    ServerRoot { path: PathBuf, source: io::Error },
    #[error("failed to bind control socket {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("failed to open log file {path}: {source}")]
    LogFile { path: PathBuf, source: io::Error },
    #[error("failed to install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}
