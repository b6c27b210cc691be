//! Credential storage
//!
//! Loads `username:hexdigest` records once at startup and answers
//! authentication queries. The store is immutable after loading and is shared
//! read-only by every session.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{info, warn};

use super::digest::sha256_hex;
use crate::error::AuthError;

/// Username to lowercase hex SHA-256 of the expected password.
#[derive(Debug, Default, Clone)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    /// Reads and parses the credential file at `path`.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let contents = fs::read_to_string(path).map_err(|source| AuthError::CredentialFile {
            path: path.to_path_buf(),
            source,
        })?;

        let store = Self::parse(&contents);
        if store.is_empty() {
            warn!("Credential file {} contains no users", path.display());
        } else {
            info!("Loaded {} user(s) from {}", store.len(), path.display());
        }
        Ok(store)
    }

    /// Parses `username:hexdigest` lines.
    ///
    /// The line is split at the first colon. Lines without a colon are
    /// skipped and a repeated username overwrites the earlier record.
    pub fn parse(contents: &str) -> Self {
        let mut users = HashMap::new();
        for line in contents.lines() {
            let Some((username, digest)) = line.split_once(':') else {
                continue;
            };
            users.insert(username.to_string(), digest.to_string());
        }
        Self { users }
    }

    /// Checks `password` against the stored digest. Unknown users always fail.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(stored) => *stored == sha256_hex(password),
            None => false,
        }
    }

    /// Whether `username` logs in with an empty password (USER alone suffices).
    pub fn accepts_empty_password(&self, username: &str) -> bool {
        self.verify(username, "")
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
