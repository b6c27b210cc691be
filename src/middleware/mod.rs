//! Server middleware
//!
//! Provides the per-session logging capability.

pub mod logging;

pub use logging::SessionLog;
