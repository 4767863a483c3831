//! services/client/src/error.rs
//!
//! Defines the primary error type for the client service and CLI.

use crate::config::ConfigError;
use screening_core::ports::PortError;
use screening_core::upload::SubmitError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    #[error("Upload error: {0}")]
    Upload(#[from] SubmitError),

    /// Building the HTTP client failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading a local file or the token store failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Invalid(String),
}
