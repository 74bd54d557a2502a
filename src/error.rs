//! Errors surfaced by the hotel boundary and by file export.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error variants for room-index operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A room number was not a non-negative integer.
    #[error("invalid room number {input:?}: {reason}")]
    InvalidKey {
        /// The rejected input, as supplied.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An arrival plan did not have the `a/b/c/d/e` shape.
    #[error("invalid arrival plan {input:?}: {reason}")]
    InvalidArrivals {
        /// The rejected input, as supplied.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A dequeue was attempted on an empty queue.
    #[error("dequeue from an empty queue")]
    EmptyQueue,

    /// Writing the export file failed. The index itself is unchanged.
    #[error("failed to export rooms to {}: {source}", path.display())]
    ExportFailed {
        /// The backing file that could not be written.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn invalid_key(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidKey {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_arrivals(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArrivals {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for room-index operations.
pub type Result<T> = std::result::Result<T, Error>;
