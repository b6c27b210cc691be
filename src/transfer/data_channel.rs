//! Module `data_channel`
//!
//! Passive-mode data connections. A `DataConnection` is a listening socket on
//! a port from the fixed PASV range; accepting its single peer consumes it and
//! yields a `DataStream`. Dropping either value closes its socket, so the
//! port is released on every exit path.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::error::TransferError;

/// Ports scanned, in order, for PASV listeners.
pub const DATA_PORT_RANGE: RangeInclusive<u16> = 20000..=21000;

/// A pending passive data connection, listening for exactly one peer.
#[derive(Debug)]
pub struct DataConnection {
    port: u16,
    owner_ip: IpAddr,
    listener: TcpListener,
}

impl DataConnection {
    /// Binds the first free port of [`DATA_PORT_RANGE`] on `bind_ip`.
    ///
    /// Only peers connecting from `owner_ip` (the control connection's
    /// address) are accepted.
    pub fn open(bind_ip: IpAddr, owner_ip: IpAddr) -> Result<Self, TransferError> {
        Self::open_in(bind_ip, owner_ip, DATA_PORT_RANGE)
    }

    pub fn open_in(
        bind_ip: IpAddr,
        owner_ip: IpAddr,
        ports: RangeInclusive<u16>,
    ) -> Result<Self, TransferError> {
        for port in ports.clone() {
            let socket = new_socket(bind_ip).map_err(TransferError::ListenerConfigurationFailed)?;
            match listen_single(socket, SocketAddr::new(bind_ip, port)) {
                Ok(listener) => {
                    debug!("PASV listener bound on {}:{}", bind_ip, port);
                    return Ok(Self {
                        port,
                        owner_ip,
                        listener,
                    });
                }
                Err(e) => trace!("Port {} unavailable: {}", port, e),
            }
        }

        Err(TransferError::NoAvailablePort {
            first: *ports.start(),
            last: *ports.end(),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the single expected peer, then closes the listener.
    ///
    /// Connections from an address other than the owner are dropped and the
    /// wait continues. `timeout` bounds the whole wait; `None` waits forever.
    pub async fn accept(self, timeout: Option<Duration>) -> Result<DataStream, TransferError> {
        let DataConnection {
            port,
            owner_ip,
            listener,
        } = self;

        let accepted = match timeout {
            Some(limit) => tokio::time::timeout(limit, accept_owner(&listener, owner_ip))
                .await
                .map_err(|_| TransferError::ConnectionTimeout(port))?,
            None => accept_owner(&listener, owner_ip).await,
        };
        drop(listener);

        let (stream, peer) = accepted.map_err(|source| TransferError::AcceptFailed { port, source })?;
        debug!("Data connection on port {} accepted from {}", port, peer);
        Ok(DataStream { port, peer, stream })
    }
}

/// An accepted data connection. Serves one transfer and is then dropped.
#[derive(Debug)]
pub struct DataStream {
    port: u16,
    peer: SocketAddr,
    stream: TcpStream,
}

impl DataStream {
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Flushes and half-closes the connection so the peer sees EOF.
    pub async fn finish(mut self) -> Result<(), TransferError> {
        self.stream
            .shutdown()
            .await
            .map_err(TransferError::TransferFailed)?;
        trace!("Data connection on port {} to {} closed", self.port, self.peer);
        Ok(())
    }
}

fn new_socket(ip: IpAddr) -> io::Result<TcpSocket> {
    match ip {
        IpAddr::V4(_) => TcpSocket::new_v4(),
        IpAddr::V6(_) => TcpSocket::new_v6(),
    }
}

/// Binds without SO_REUSEADDR: a port stays taken while an accepted stream
/// on it is still open.
fn listen_single(socket: TcpSocket, addr: SocketAddr) -> io::Result<TcpListener> {
    socket.bind(addr)?;
    socket.listen(1)
}

async fn accept_owner(listener: &TcpListener, owner_ip: IpAddr) -> io::Result<(TcpStream, SocketAddr)> {
    loop {
        let (stream, peer) = listener.accept().await?;
        if peer.ip() == owner_ip {
            return Ok((stream, peer));
        }
        warn!(
            "Rejected data connection from {} (expected {})",
            peer, owner_ip
        );
    }
}
