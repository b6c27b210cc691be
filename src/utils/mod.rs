//! Utility modules
//!
//! Process-level helpers used by the binary.

pub mod logging;

pub use logging::setup_logging;
