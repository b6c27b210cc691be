//! Shared server context
//!
//! Everything a session needs from the server that never changes after
//! startup. Built once and shared behind an `Arc`.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use log::info;

use crate::auth::CredentialStore;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::storage::Jail;

#[derive(Debug)]
pub struct ServerContext {
    credentials: CredentialStore,
    jail: Jail,
    bind_ip: IpAddr,
    pasv_address: Ipv4Addr,
    data_accept_timeout: Option<Duration>,
    idle_timeout: Option<Duration>,
    max_command_length: usize,
}

impl ServerContext {
    pub fn new(
        credentials: CredentialStore,
        jail: Jail,
        config: &ServerConfig,
    ) -> Result<Self, ServerError> {
        Ok(Self {
            credentials,
            jail,
            bind_ip: config.bind_ip()?,
            pasv_address: config.pasv_ip()?,
            data_accept_timeout: config.data_accept_timeout(),
            idle_timeout: config.idle_timeout(),
            max_command_length: config.max_command_length,
        })
    }

    /// Loads the credential file and canonicalizes the server root.
    ///
    /// Either failing is fatal at startup.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let credentials = CredentialStore::load(&config.credentials_file)?;
        let jail = Jail::new(&config.server_root).map_err(|source| ServerError::ServerRoot {
            path: config.server_root.clone(),
            source,
        })?;
        info!("Server root directory: {}", jail.root().display());
        Self::new(credentials, jail, config)
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn jail(&self) -> &Jail {
        &self.jail
    }

    pub fn bind_ip(&self) -> IpAddr {
        self.bind_ip
    }

    pub fn pasv_address(&self) -> Ipv4Addr {
        self.pasv_address
    }

    pub fn data_accept_timeout(&self) -> Option<Duration> {
        self.data_accept_timeout
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    pub fn max_command_length(&self) -> usize {
        self.max_command_length
    }
}
