//! Error handlers
//!
//! Converts recoverable errors into the reply sent to the client. Only fixed
//! phrases are used; internal error text stays in the log.

use crate::error::types::{PathError, TransferError};
use crate::protocol::responses::{
    CANT_OPEN_DATA, FILE_BUSY, FILE_UNAVAILABLE, LOCAL_ERROR, Reply, TRANSFER_ABORTED,
};

impl PathError {
    /// Reply for a failed path resolution. Always a 550.
    pub fn to_reply(&self) -> Reply {
        match self {
            PathError::InvalidFileName(_) => Reply::new(FILE_UNAVAILABLE, "File name not allowed"),
            PathError::NotAFile(_) => Reply::new(FILE_UNAVAILABLE, "Not a regular file"),
            PathError::NotADirectory(_) => Reply::new(FILE_UNAVAILABLE, "Not a directory"),
            PathError::IsADirectory(_) => Reply::new(FILE_UNAVAILABLE, "Is a directory"),
            PathError::Unresolvable { .. } | PathError::OutsideRoot(_) => {
                Reply::new(FILE_UNAVAILABLE, "Requested action not taken; file unavailable")
            }
        }
    }
}

impl TransferError {
    /// Reply for a failed data connection or transfer.
    pub fn to_reply(&self) -> Reply {
        match self {
            TransferError::DataChannelNotInitialized => Reply::new(CANT_OPEN_DATA, "Use PASV first"),
            TransferError::NoAvailablePort { .. }
            | TransferError::ListenerConfigurationFailed(_)
            | TransferError::ConnectionTimeout(_)
            | TransferError::AcceptFailed { .. } => {
                Reply::new(CANT_OPEN_DATA, "Can't open data connection")
            }
            TransferError::TransferFailed(_) => {
                Reply::new(TRANSFER_ABORTED, "Connection closed; transfer aborted")
            }
            TransferError::LocalFile(_) => Reply::new(
                LOCAL_ERROR,
                "Requested action aborted: local error in processing",
            ),
            TransferError::UploadInProgress(_) => Reply::new(FILE_BUSY, "File busy"),
        }
    }
}
