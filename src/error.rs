//! Error types for the webhook core.
//!
//! Every error reaching the mutation orchestrator is turned into a fully
//! populated admission response; nothing escapes as a bare transport 500.

use thiserror::Error;

/// Error type for admission handling
#[derive(Error, Debug)]
pub enum Error {
    /// Unparsable admission input (missing or undecodable object)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The Service directory could not be listed (network/auth/timeout)
    #[error("service directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// Serialization failure while re-encoding or diffing objects
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result type alias for webhook operations
pub type Result<T> = std::result::Result<T, Error>;
