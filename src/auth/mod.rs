//! Authentication system
//!
//! Credential loading and password verification.

pub mod credentials;
pub mod digest;

pub use credentials::CredentialStore;
pub use digest::sha256_hex;
