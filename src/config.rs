//! Configuration management for RAX FTP Server
//!
//! Built-in defaults, overridden by an optional TOML file, overridden by
//! `RAX_FTPD_*` environment variables. Everything here is read once at startup.

use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Environment variable naming the config file when no CLI argument is given.
pub const CONFIG_PATH_ENV: &str = "RAX_FTPD_CONFIG";
/// Prefix of per-key environment overrides, e.g. `RAX_FTPD_CONTROL_PORT`.
pub const ENV_PREFIX: &str = "RAX_FTPD";
const DEFAULT_CONFIG_FILE: &str = "config.toml";

const MIN_COMMAND_LENGTH: usize = 16;
const MAX_COMMAND_LENGTH: usize = 64 * 1024;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// IP address for the control listener and every PASV listener
    pub bind_address: String,

    /// Port for FTP control connection; 0 picks an ephemeral port
    pub control_port: u16,

    /// IPv4 address advertised in PASV replies
    pub pasv_address: String,

    /// Root directory for FTP operations
    pub server_root: PathBuf,

    /// `username:hexsha256` credential file
    pub credentials_file: PathBuf,

    /// How long a data command waits for the passive peer (0 = forever)
    pub data_accept_timeout_secs: u64,

    /// How long the control connection may stay silent (0 = forever)
    pub idle_timeout_secs: u64,

    /// Maximum FTP command line length
    pub max_command_length: usize,

    /// Append log records here instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            control_port: 2121,
            pasv_address: "127.0.0.1".to_string(),
            server_root: PathBuf::from("./server_root"),
            credentials_file: PathBuf::from("./users.txt"),
            data_accept_timeout_secs: 30,
            idle_timeout_secs: 300,
            max_command_length: 512,
            log_file: None,
        }
    }
}

impl ServerConfig {
    /// Loads the configuration for the running process.
    ///
    /// The TOML file is the first CLI argument, else `$RAX_FTPD_CONFIG`, else
    /// `./config.toml` if it exists.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = env::args_os()
            .nth(1)
            .or_else(|| env::var_os(CONFIG_PATH_ENV))
            .map(PathBuf::from);
        Self::load_from(explicit.as_deref())
    }

    /// Loads defaults, then `path` (required when given), then the environment.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::new(&path.to_string_lossy(), FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let settings = Self::defaults()?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let d = Self::default();
        Config::builder()
            .set_default("bind_address", d.bind_address)?
            .set_default("control_port", i64::from(d.control_port))?
            .set_default("pasv_address", d.pasv_address)?
            .set_default("server_root", d.server_root.to_string_lossy().into_owned())?
            .set_default(
                "credentials_file",
                d.credentials_file.to_string_lossy().into_owned(),
            )?
            .set_default("data_accept_timeout_secs", d.data_accept_timeout_secs as i64)?
            .set_default("idle_timeout_secs", d.idle_timeout_secs as i64)?
            .set_default("max_command_length", d.max_command_length as i64)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Message(format!(
                "bind_address must be an IP address, got {:?}",
                self.bind_address
            )));
        }

        if self.pasv_address.parse::<Ipv4Addr>().is_err() {
            return Err(ConfigError::Message(format!(
                "pasv_address must be an IPv4 address, got {:?}",
                self.pasv_address
            )));
        }

        if self.server_root.as_os_str().is_empty() {
            return Err(ConfigError::Message("server_root cannot be empty".into()));
        }

        if self.credentials_file.as_os_str().is_empty() {
            return Err(ConfigError::Message(
                "credentials_file cannot be empty".into(),
            ));
        }

        if !(MIN_COMMAND_LENGTH..=MAX_COMMAND_LENGTH).contains(&self.max_command_length) {
            return Err(ConfigError::Message(format!(
                "max_command_length must be between {MIN_COMMAND_LENGTH} and {MAX_COMMAND_LENGTH}"
            )));
        }

        Ok(())
    }

    pub fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        self.bind_address
            .parse()
            .map_err(|_| ConfigError::Message(format!("invalid bind_address {:?}", self.bind_address)))
    }

    pub fn pasv_ip(&self) -> Result<Ipv4Addr, ConfigError> {
        self.pasv_address
            .parse()
            .map_err(|_| ConfigError::Message(format!("invalid pasv_address {:?}", self.pasv_address)))
    }

    pub fn data_accept_timeout(&self) -> Option<Duration> {
        secs_or_unbounded(self.data_accept_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        secs_or_unbounded(self.idle_timeout_secs)
    }
}

fn secs_or_unbounded(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn file_values_override_defaults() {
        let file = toml_file(
            r#"
control_port = 2200
server_root = "/srv/ftp"
idle_timeout_secs = 0
log_file = "/var/log/rax-ftpd.log"
"#,
        );
        let config = ServerConfig::load_from(Some(file.path())).unwrap();

        assert_eq!(config.control_port, 2200);
        assert_eq!(config.server_root, PathBuf::from("/srv/ftp"));
        assert_eq!(config.idle_timeout(), None);
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/rax-ftpd.log")));
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.data_accept_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.max_command_length, 512);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = toml_file("");
        let config = ServerConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(ServerConfig::load_from(Some(&tmp.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let file = toml_file("pasv_address = \"::1\"\n");
        assert!(ServerConfig::load_from(Some(file.path())).is_err());

        let config = ServerConfig {
            bind_address: "localhost".into(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            max_command_length: 4,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            max_command_length: usize::MAX,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            max_command_length: 64 * 1024,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_ok());

        let config = ServerConfig {
            server_root: PathBuf::new(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_addresses_parse() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_ip().unwrap(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.pasv_ip().unwrap(), Ipv4Addr::LOCALHOST);
    }
}
