//! Client module
//!
//! Per-connection session state and the control connection loop.

pub mod handler;
pub mod session;
pub mod state;

pub use handler::handle_client;
pub use session::Session;
pub use state::AuthState;
