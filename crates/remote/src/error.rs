use std::path::PathBuf;

/// Errors raised while talking to a station's remote host.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Authentication or network setup failed.
    #[error("Connection to {host} failed: {detail}")]
    Connection { host: String, detail: String },

    /// A remote directory could not be enumerated.
    #[error("Listing {path} failed: {detail}")]
    Listing { path: String, detail: String },

    /// A remote file could not be read.
    #[error("Fetching {path} failed: {detail}")]
    Fetch { path: String, detail: String },

    /// Writing a downloaded file locally failed.
    #[error("Local write to {path} failed: {source}")]
    Local {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking SFTP task panicked or was aborted.
    #[error("Remote task failed: {0}")]
    Task(String),
}

impl RemoteError {
    /// True for failures that happened before any listing or fetch ran.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}
