//! Module `file_ops`
//!
//! Moves bytes between the filesystem and an accepted data connection for
//! LIST, RETR and STOR. Each function consumes the `DataStream`, so the data
//! connection is closed when the transfer ends, whatever the outcome.

use std::ffi::OsString;
use std::fs as std_fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::TransferError;
use crate::transfer::DataStream;

const BUFFER_SIZE: usize = 8192; // 8KB buffer for better performance

/// Sends a prepared directory listing.
pub async fn send_listing(mut data: DataStream, listing: String) -> Result<u64, TransferError> {
    data.stream_mut()
        .write_all(listing.as_bytes())
        .await
        .map_err(TransferError::TransferFailed)?;
    data.finish().await?;
    Ok(listing.len() as u64)
}

/// Streams an already opened file to the peer.
pub async fn send_file(mut data: DataStream, mut file: File) -> Result<u64, TransferError> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total_bytes_sent = 0u64;

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .map_err(TransferError::LocalFile)?;
        if n == 0 {
            break;
        }
        data.stream_mut()
            .write_all(&buffer[..n])
            .await
            .map_err(TransferError::TransferFailed)?;
        total_bytes_sent += n as u64;
    }

    data.finish().await?;
    Ok(total_bytes_sent)
}

/// An upload in progress.
///
/// Bytes go to a hidden sibling file that replaces the target only once the
/// peer has closed the connection cleanly. If the upload is dropped before
/// that, the temporary file is removed and any previous target is untouched.
#[derive(Debug)]
pub struct PartialUpload {
    target: PathBuf,
    temp_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl PartialUpload {
    /// Creates the temporary file next to `target`.
    ///
    /// Fails with `UploadInProgress` if another upload to the same target is
    /// running.
    pub async fn create(target: PathBuf) -> Result<Self, TransferError> {
        let temp_path = temp_path_for(&target);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => TransferError::UploadInProgress(target.clone()),
                _ => TransferError::LocalFile(e),
            })?;

        Ok(Self {
            target,
            temp_path,
            file: Some(file),
            committed: false,
        })
    }

    /// Reads the peer until EOF, then moves the data over the target.
    pub async fn receive(mut self, mut data: DataStream) -> Result<u64, TransferError> {
        let Some(mut file) = self.file.take() else {
            return Err(TransferError::LocalFile(std::io::Error::other(
                "upload file already consumed",
            )));
        };

        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut total_bytes_received = 0u64;

        loop {
            let n = data
                .stream_mut()
                .read(&mut buffer)
                .await
                .map_err(TransferError::TransferFailed)?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n])
                .await
                .map_err(TransferError::LocalFile)?;
            total_bytes_received += n as u64;
        }
        drop(data);

        file.sync_all().await.map_err(TransferError::LocalFile)?;
        drop(file);

        fs::rename(&self.temp_path, &self.target)
            .await
            .map_err(TransferError::LocalFile)?;
        self.committed = true;

        info!(
            "Stored {} ({} bytes)",
            self.target.display(),
            total_bytes_received
        );
        Ok(total_bytes_received)
    }
}

impl Drop for PartialUpload {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Close the handle before unlinking.
        self.file.take();
        if let Err(e) = std_fs::remove_file(&self.temp_path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(
                    "Failed to remove partial upload {}: {}",
                    self.temp_path.display(),
                    e
                );
            }
        }
    }
}

/// `dir/name` becomes `dir/.name.upload`.
fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    if let Some(file_name) = target.file_name() {
        name.push(file_name);
    }
    name.push(".upload");
    target.with_file_name(name)
}
