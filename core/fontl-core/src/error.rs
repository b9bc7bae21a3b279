//! Error taxonomy for the font catalog (made by FontLab https://www.fontlab.com/)

use std::io;
use std::path::PathBuf;
use std::result;

/// Coarse classification used by callers that map errors onto a surface
/// (HTTP status codes, exit codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape: wrong extension, malformed name, missing field.
    Validation,
    /// Unknown catalog key or missing file.
    NotFound,
    /// The request collides with something already on disk or in the index.
    Conflict,
    /// Filesystem or encoding failure.
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid metadata in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(
        "duplicate font filename {filename}: {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateName {
        filename: String,
        first: PathBuf,
        second: PathBuf,
    },
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::Conflict(_) | CatalogError::DuplicateName { .. } => ErrorKind::Conflict,
            CatalogError::Io { .. } | CatalogError::Json { .. } | CatalogError::Walk { .. } => {
                ErrorKind::Io
            }
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        CatalogError::Json {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = result::Result<T, CatalogError>;
