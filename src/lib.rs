//! RAX FTP Server
//!
//! A minimal RFC 959 FTP server: USER/PASS login against SHA-256 credentials,
//! passive-mode LIST, RETR and STOR, all confined to one server root.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod server;
pub mod storage;
pub mod transfer;
pub mod utils;

pub use config::ServerConfig;
pub use server::{Server, ServerContext};
