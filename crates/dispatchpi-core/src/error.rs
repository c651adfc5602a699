//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::scheduler::Target;
use crate::service::ProviderError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Dequeue was called on an empty queue.
    #[error("Cannot dequeue from an empty queue")]
    EmptyQueue,

    /// No queued item has a display date of today or later.
    #[error("No image is due for {0}")]
    NoDueItem(Target),

    /// A persisted queue file exists but could not be parsed.
    #[error("Failed to load queue from {}: {reason}", path.display())]
    Load {
        /// Location of the persisted queue.
        path: PathBuf,
        /// Why the content was rejected.
        reason: String,
    },

    /// The next display date would fall outside the supported calendar range.
    #[error("Display date out of range")]
    DateOutOfRange,

    /// Mail provider operation failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Rendering an image for display failed.
    #[error("Render error: {0}")]
    Render(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
