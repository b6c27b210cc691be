//! Transfer module for FTP server
//!
//! Passive data connection lifecycle and the byte streaming done over it.

pub mod data_channel;
pub mod file_ops;

pub use data_channel::{DATA_PORT_RANGE, DataConnection, DataStream};
pub use file_ops::{PartialUpload, send_file, send_listing};
