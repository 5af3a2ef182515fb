/// Error types shared by the gallery core and its collaborators
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a `FileAccessor`
///
/// Surfaced to the caller as-is; the core never retries these automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl AccessError {
    /// Classify an `io::Error` raised while touching `what`
    pub fn from_io(err: io::Error, what: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AccessError::NotFound(what.to_string()),
            io::ErrorKind::PermissionDenied => AccessError::PermissionDenied(what.to_string()),
            _ => AccessError::Io(format!("{}: {}", what, err)),
        }
    }
}

/// Failures persisting preferences
#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Error taxonomy of the gallery core
///
/// `Clone` because a single memoized load hands its outcome to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GalleryError {
    /// Source bytes could not be read
    #[error("failed to read image: {0}")]
    Read(String),
    /// Dimensions could not be probed by any method
    #[error("failed to decode image: {0}")]
    Decode(String),
    /// Save or delete was denied or failed
    #[error("failed to write: {0}")]
    Write(String),
    /// Entry vanished between enumeration and access
    #[error("file no longer exists: {0}")]
    NotFound(String),
    /// The target item was removed or released while the operation was in flight
    #[error("item is no longer part of the gallery")]
    Stale,
}

impl GalleryError {
    /// Map an accessor failure raised while reading
    pub fn read(err: AccessError) -> Self {
        match err {
            AccessError::NotFound(path) => GalleryError::NotFound(path),
            other => GalleryError::Read(other.to_string()),
        }
    }

    /// Map an accessor failure raised while writing or deleting
    pub fn write(err: AccessError) -> Self {
        match err {
            AccessError::NotFound(path) => GalleryError::NotFound(path),
            other => GalleryError::Write(other.to_string()),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, GalleryError::Stale)
    }
}
