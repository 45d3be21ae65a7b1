//! Error types for the AVI writer.
//!
//! Every failure is reported at the call that triggered it. Nothing is
//! retried and nothing is rolled back: once a write, seek or position query
//! fails the writer is left at an unknown position and must be discarded.

use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for AVI writer operations.
pub type Result<T> = std::result::Result<T, AviError>;

/// Errors that can occur while writing an AVI file.
#[derive(Error, Debug)]
pub enum AviError {
    /// The output file could not be created or truncated.
    #[error("Failed to create '{}': {source}", .path.display())]
    SinkCreation {
        /// Path that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The index table could not grow.
    #[error("Failed to grow chunk index: {0}")]
    Allocation(#[from] TryReserveError),

    /// Writing to the sink failed or was short.
    #[error("Write failed: {0}")]
    Write(#[source] io::Error),

    /// Seeking the sink failed.
    #[error("Seek to offset {offset} failed: {source}")]
    Seek {
        /// Absolute offset the writer tried to reach.
        offset: u64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The sink could not report its current position.
    #[error("Position query failed: {0}")]
    PositionQuery(#[source] io::Error),

    /// Audio was appended to a file opened without an audio stream.
    #[error("No audio stream was declared when the file was opened")]
    NoAudioStream,

    /// A stream parameter is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A single chunk does not fit in a 32-bit RIFF size field.
    #[error("Chunk of {len} bytes exceeds the 32-bit RIFF size limit")]
    ChunkTooLarge {
        /// Payload length handed to the writer.
        len: usize,
    },

    /// Appending would push the file past the 32-bit RIFF size limit.
    #[error("File would grow to {size} bytes, beyond the 32-bit RIFF size limit")]
    FileTooLarge {
        /// Projected file size in bytes.
        size: u64,
    },
}

impl AviError {
    /// Build an [`AviError::InvalidParameter`] from any message.
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        AviError::InvalidParameter(message.into())
    }

    /// Whether this error is a caller precondition violation rather than a
    /// sink failure.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            AviError::NoAudioStream
                | AviError::InvalidParameter(_)
                | AviError::ChunkTooLarge { .. }
                | AviError::FileTooLarge { .. }
        )
    }
}
