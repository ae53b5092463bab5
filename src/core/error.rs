//! Error types for the streaming runtime
//!
//! Content and fetch errors are recoverable: a tile that fails to decode or
//! download simply never becomes resident, and streaming continues. GPU and
//! lifecycle errors indicate setup or programmer mistakes and are treated as
//! fatal at the call site.

use thiserror::Error;

/// Main error type for the streaming runtime
#[derive(Debug, Error)]
pub enum Error {
    #[error("content error: {0}")]
    Content(String),

    #[error("fetch failed with status {status}: {message}")]
    Fetch { status: u16, message: String },

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}
