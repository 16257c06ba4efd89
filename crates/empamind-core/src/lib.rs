//! Domain layer for the EmpaMind client.
//!
//! Holds the conversation model, the error type and the collaborator traits
//! (`ChatTransport`, `AuthSession`) that the application layer is written
//! against.

pub mod auth;
pub mod config;
pub mod conversation;
pub mod error;
pub mod transport;

// Re-export common error type
pub use error::{EmpaMindError, Result};
