//! Error types shared by slicing, generation and export.

use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type SliceResult<T> = Result<T, SliceError>;

/// Everything that can stop an operation.
///
/// Recoverable geometry problems (bad triangle indices, open chains, degenerate
/// extents) are never reported here; they are skipped, counted and logged.
#[derive(Debug, thiserror::Error)]
pub enum SliceError {
    /// (Io) A file or directory could not be created or written
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// (UnknownFormat) The requested export format is not recognised
    #[error("unknown export format: {0}")]
    UnknownFormat(String),

    /// (NotApplicable) The format cannot be produced from the data at this stage
    #[error("{format} export not applicable: {reason}")]
    NotApplicable { format: String, reason: String },

    /// (Unsupported) The format was compiled out
    #[error("{format} export is not available in this build")]
    Unsupported { format: String },

    /// (Cancelled) A cooperative cancellation request stopped the run
    #[error("generation cancelled")]
    Cancelled,

    /// (InvalidInput) The caller passed values the operation cannot work with
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// (Worker) A background generation thread stopped without delivering a result
    #[error("generation worker stopped: {0}")]
    Worker(String),

    /// (StlRead) An STL file could not be parsed
    #[cfg(feature = "stl-io")]
    #[error("failed to read STL: {0}")]
    StlRead(#[source] std::io::Error),
}

impl SliceError {
    /// Wraps an I/O error together with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SliceError::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for [`SliceError::Cancelled`], which callers treat differently from failure.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, SliceError::Cancelled)
    }
}
