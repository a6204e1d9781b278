//! Error types for conversions.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while converting a file.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The input is structurally invalid (bad CSV, bad JSON, mismatched fields).
    #[error("{0}")]
    Validation(String),

    /// Any other failure reading or writing a file.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConvertError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ConvertError::Validation(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps an error from opening or reading an input file. A missing input
    /// is reported as `NotFound`, everything else as `Io`.
    pub(crate) fn from_input(path: &std::path::Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ConvertError::NotFound(path.to_path_buf())
        } else {
            ConvertError::io(path, source)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ConvertError::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ConvertError::Validation(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(self, ConvertError::Io { .. })
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
