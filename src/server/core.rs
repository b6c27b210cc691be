//! Connection acceptor
//!
//! Binds the control port and starts one session task per accepted client.
//! The accept loop never performs session I/O itself.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::net::TcpListener;

use crate::client::handle_client;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::middleware::SessionLog;
use crate::server::ServerContext;

/// Pause after a failed accept, so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    listener: TcpListener,
    context: Arc<ServerContext>,
    next_session_id: u64,
}

impl Server {
    /// Binds the control socket. Failure is fatal to the process.
    pub async fn bind(config: &ServerConfig, context: ServerContext) -> Result<Self, ServerError> {
        let addr = SocketAddr::new(context.bind_ip(), config.control_port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        info!(
            "Server bound to {}",
            listener.local_addr().unwrap_or(addr)
        );

        Ok(Self {
            listener,
            context: Arc::new(context),
            next_session_id: 0,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts clients forever. Accept errors are logged and the loop goes on.
    pub async fn run(mut self) {
        info!(
            "Starting Rax FTP server, serving {}",
            self.context.jail().root().display()
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    self.next_session_id += 1;
                    let log = SessionLog::new(self.next_session_id, peer);
                    let context = Arc::clone(&self.context);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(handle_client(stream, context, log));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}
