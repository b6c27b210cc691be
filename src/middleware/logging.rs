//! Logging middleware
//!
//! `SessionLog` is handed to each session when it is created and emits every
//! record for that connection, tagged with the session id and peer address.

use std::fmt;
use std::net::SocketAddr;

use log::{debug, error, info, warn};

use crate::protocol::{Command, Reply};

/// Per-connection logging capability.
#[derive(Debug, Clone)]
pub struct SessionLog {
    id: u64,
    peer: SocketAddr,
}

impl SessionLog {
    pub fn new(id: u64, peer: SocketAddr) -> Self {
        Self { id, peer }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Log a client connection
    pub fn connected(&self) {
        info!("{} connected", self);
    }

    /// Log a client disconnect, with the reason it ended.
    pub fn disconnected(&self, reason: &str) {
        info!("{} disconnected ({})", self, reason);
    }

    /// Log a client command. `PASS` arguments are masked by `Command`'s
    /// `Display`.
    pub fn command(&self, command: &Command) {
        info!("{} executed: {}", self, command);
    }

    pub fn reply(&self, reply: &Reply) {
        debug!("{} <- {} {}", self, reply.code(), reply.text());
    }

    pub fn login(&self, username: &str) {
        info!("{} logged in as {}", self, username);
    }

    pub fn transfer(&self, action: &str, path: &str, bytes: u64, data_peer: SocketAddr) {
        info!(
            "{} {} {} ({} bytes, data connection {})",
            self, action, path, bytes, data_peer
        );
    }

    /// Per-command failure the client is told about.
    pub fn failure(&self, command: &Command, reason: &str) {
        warn!("{} {} failed: {}", self, command, reason);
    }

    /// I/O fault on the control connection or local filesystem.
    pub fn fault(&self, context: &str, err: &dyn std::error::Error) {
        error!("{} {}: {}", self, context, err);
    }
}

impl fmt::Display for SessionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Client {} [#{}]", self.peer, self.id)
    }
}
