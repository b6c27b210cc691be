//! Server core functionality
//!
//! The connection acceptor and the read-only context shared by every session.

pub mod context;
pub mod core;

pub use context::ServerContext;
pub use core::Server;
