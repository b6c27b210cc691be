//! File system storage
//!
//! Path containment for client paths and directory listings.

pub mod operations;
pub mod validation;

pub use operations::list_directory;
pub use validation::{Jail, is_within};
