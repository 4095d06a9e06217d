use std::fmt;
use std::path::Path;

use cassandra_remote::RemoteError;

/// Which remote boundary a refresh failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFailureKind {
    /// Authentication or network setup.
    Connection,
    /// A remote directory could not be enumerated.
    Listing,
    Fetch,
    Local,
    Task,
}

impl fmt::Display for RemoteFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connection => "connection",
            Self::Listing => "listing",
            Self::Fetch => "fetch",
            Self::Local => "local write",
            Self::Task => "task",
        })
    }
}

/// Cache failures. Cloneable so one refresh result can be handed to every
/// caller waiting on the same bucket.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O error at {path}: {detail}")]
    Io { path: String, detail: String },

    #[error("Corrupt cache file {path}: {detail}")]
    Corrupt { path: String, detail: String },

    #[error("Remote {kind} failure: {detail}")]
    Remote {
        kind: RemoteFailureKind,
        detail: String,
    },

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

impl From<&RemoteError> for CacheError {
    fn from(err: &RemoteError) -> Self {
        let kind = match err {
            RemoteError::Connection { .. } => RemoteFailureKind::Connection,
            RemoteError::Listing { .. } => RemoteFailureKind::Listing,
            RemoteError::Fetch { .. } => RemoteFailureKind::Fetch,
            RemoteError::Local { .. } => RemoteFailureKind::Local,
            RemoteError::Task(_) => RemoteFailureKind::Task,
        };
        Self::Remote {
            kind,
            detail: err.to_string(),
        }
    }
}

impl From<RemoteError> for CacheError {
    fn from(err: RemoteError) -> Self {
        Self::from(&err)
    }
}

impl CacheError {
    /// The remote boundary that failed, if this is a remote failure.
    pub fn remote_kind(&self) -> Option<RemoteFailureKind> {
        match self {
            Self::Remote { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            detail: err.to_string(),
        }
    }

    pub(crate) fn corrupt(path: &Path, detail: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            path: path.display().to_string(),
            detail: detail.to_string(),
        }
    }
}
