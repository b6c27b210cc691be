//! Module `state`
//!
//! Authentication states of a control connection and the transitions
//! between them.

/// Where a session is in the USER/PASS exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    /// USER accepted, waiting for PASS.
    AwaitingPassword { username: String },
    Authenticated { username: String },
}

impl AuthState {
    /// USER from any state restarts the login.
    pub fn user(username: String, accepts_empty_password: bool) -> Self {
        if accepts_empty_password {
            AuthState::Authenticated { username }
        } else {
            AuthState::AwaitingPassword { username }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    /// Username waiting for its password, if any.
    pub fn pending_user(&self) -> Option<&str> {
        match self {
            AuthState::AwaitingPassword { username } => Some(username),
            _ => None,
        }
    }

    /// Username of the logged in user, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            AuthState::Authenticated { username } => Some(username),
            _ => None,
        }
    }
}
