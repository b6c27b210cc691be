//! Module `session`
//!
//! Defines the `Session` struct: the per-connection state owned by one
//! control connection task. Nothing in it is shared with other sessions.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::client::state::AuthState;
use crate::middleware::SessionLog;
use crate::server::ServerContext;
use crate::transfer::DataConnection;

/// State of one FTP control connection.
///
/// Holds the login state and at most one pending passive data connection.
#[derive(Debug)]
pub struct Session {
    peer: SocketAddr,
    auth: AuthState,
    data: Option<DataConnection>,
    context: Arc<ServerContext>,
    log: SessionLog,
}

impl Session {
    pub fn new(peer: SocketAddr, context: Arc<ServerContext>, log: SessionLog) -> Self {
        Self {
            peer,
            auth: AuthState::default(),
            data: None,
            context,
            log,
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn context(&self) -> &ServerContext {
        &self.context
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    pub fn pending_user(&self) -> Option<&str> {
        self.auth.pending_user()
    }

    /// Returns whether a passive data connection is waiting for its peer.
    pub fn has_data_connection(&self) -> bool {
        self.data.is_some()
    }

    // --------------------
    // Login transitions
    // --------------------

    /// Starts a login for `username`. Any pending data connection is dropped.
    ///
    /// Returns whether the user was logged in without a password.
    pub fn begin_login(&mut self, username: String) -> bool {
        self.close_data_connection();
        let auto = self.context.credentials().accepts_empty_password(&username);
        self.auth = AuthState::user(username, auto);
        auto
    }

    /// Checks `password` for the pending user.
    ///
    /// On success the session is authenticated; on failure it goes back to
    /// `Unauthenticated`. Returns `None` when no USER is pending.
    pub fn complete_login(&mut self, password: &str) -> Option<bool> {
        let username = self.auth.pending_user()?.to_string();
        if self.context.credentials().verify(&username, password) {
            self.auth = AuthState::Authenticated { username };
            Some(true)
        } else {
            self.auth = AuthState::Unauthenticated;
            Some(false)
        }
    }

    // --------------------
    // Data connection
    // --------------------

    /// Installs a new passive connection, returning the one it replaces.
    pub fn replace_data_connection(&mut self, data: DataConnection) -> Option<DataConnection> {
        self.data.replace(data)
    }

    /// Takes the pending passive connection for a data command.
    pub fn take_data_connection(&mut self) -> Option<DataConnection> {
        self.data.take()
    }

    /// Drops the pending passive connection, releasing its port.
    pub fn close_data_connection(&mut self) {
        self.data = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialStore, sha256_hex};
    use crate::config::ServerConfig;
    use crate::storage::Jail;
    use std::net::{IpAddr, Ipv4Addr};

    fn session() -> (tempfile::TempDir, Session) {
        let tmp = tempfile::tempdir().unwrap();
        let credentials = CredentialStore::parse(&format!(
            "alice:{}\nguest:{}\n",
            sha256_hex("wonderland"),
            sha256_hex("")
        ));
        let jail = Jail::new(tmp.path()).unwrap();
        let context = ServerContext::new(credentials, jail, &ServerConfig::default()).unwrap();
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let session = Session::new(peer, Arc::new(context), SessionLog::new(1, peer));
        (tmp, session)
    }

    #[test]
    fn password_login() {
        let (_tmp, mut session) = session();
        assert!(!session.begin_login("alice".into()));
        assert_eq!(session.pending_user(), Some("alice"));
        assert_eq!(session.complete_login("wonderland"), Some(true));
        assert!(session.is_authenticated());
        assert_eq!(session.auth.username(), Some("alice"));
    }

    #[test]
    fn wrong_password_clears_pending_user() {
        let (_tmp, mut session) = session();
        session.begin_login("alice".into());
        assert_eq!(session.complete_login("nope"), Some(false));
        assert_eq!(session.auth, AuthState::Unauthenticated);
        assert_eq!(session.complete_login("wonderland"), None);
    }

    #[test]
    fn pass_without_user_is_a_sequence_error() {
        let (_tmp, mut session) = session();
        assert_eq!(session.complete_login("anything"), None);
    }

    #[test]
    fn empty_password_account_logs_in_on_user() {
        let (_tmp, mut session) = session();
        assert!(session.begin_login("guest".into()));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn relogin_drops_pending_data_connection() {
        let (_tmp, mut session) = session();
        session.begin_login("guest".into());
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let data = DataConnection::open(localhost, localhost).unwrap();
        assert!(session.replace_data_connection(data).is_none());
        assert!(session.has_data_connection());

        session.begin_login("alice".into());
        assert!(!session.has_data_connection());
        assert!(!session.is_authenticated());
    }
}
