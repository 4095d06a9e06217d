//! Blocking SSH + SFTP session to a single station host.
//!
//! [`RemoteSession`] owns one authenticated SSH connection and one SFTP
//! sub-channel. It is not safe for interleaved use from several threads;
//! [`crate::client::RemoteListingClient`] serializes access behind a lock
//! and drives it from `spawn_blocking`.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use ssh2::{ErrorCode, Session, Sftp};

use cassandra_core::types::Timestamp;

use crate::error::RemoteError;

/// Connection parameters for one station.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Private key file, already `~`-expanded.
    pub key_path: PathBuf,
    /// Applied to the TCP connect and every blocking SSH call.
    pub timeout: Duration,
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub filename: String,
    /// Last modification time, when the server reports one.
    pub modified: Option<Timestamp>,
    pub size: Option<u64>,
    pub is_dir: bool,
}

/// An open SSH connection plus its SFTP channel.
pub struct RemoteSession {
    // Declared first so the channel is dropped before the connection.
    sftp: Sftp,
    session: Session,
    host: String,
    broken: bool,
}

/// True when libssh2 reports the connection itself failed (a timeout or
/// socket error) rather than an SFTP status such as a missing file.
pub(crate) fn is_transport_failure(err: &ssh2::Error) -> bool {
    matches!(err.code(), ErrorCode::Session(_))
}

impl RemoteSession {
    /// Connect, authenticate with the private key and open SFTP.
    pub fn open(params: &SessionParams) -> Result<Self, RemoteError> {
        let conn_err = |detail: String| RemoteError::Connection {
            host: format!("{}:{}", params.host, params.port),
            detail,
        };

        let addr = (params.host.as_str(), params.port)
            .to_socket_addrs()
            .map_err(|e| conn_err(format!("address resolution failed: {e}")))?
            .next()
            .ok_or_else(|| conn_err("host resolved to no addresses".into()))?;

        let tcp = TcpStream::connect_timeout(&addr, params.timeout)
            .map_err(|e| conn_err(format!("TCP connect failed: {e}")))?;

        let mut session = Session::new().map_err(|e| conn_err(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(params.timeout.as_millis()).unwrap_or(u32::MAX));
        session
            .handshake()
            .map_err(|e| conn_err(format!("SSH handshake failed: {e}")))?;

        session
            .userauth_pubkey_file(&params.username, None, &params.key_path, None)
            .map_err(|e| {
                conn_err(format!(
                    "public key authentication as '{}' with {} failed: {e}",
                    params.username,
                    params.key_path.display()
                ))
            })?;
        if !session.authenticated() {
            return Err(conn_err("server did not accept the key".into()));
        }

        let sftp = session
            .sftp()
            .map_err(|e| conn_err(format!("SFTP subsystem unavailable: {e}")))?;

        tracing::info!(host = %params.host, port = params.port, user = %params.username, "Opened SFTP session");

        Ok(Self {
            sftp,
            session,
            host: params.host.clone(),
            broken: false,
        })
    }

    /// Enumerate one remote directory (`.` and `..` excluded).
    ///
    /// A missing or unreadable directory is a [`RemoteError::Listing`],
    /// never an empty result.
    pub fn list_dir(&mut self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let entries = match self.sftp.readdir(Path::new(dir)) {
            Ok(entries) => entries,
            Err(e) => {
                self.broken |= is_transport_failure(&e);
                return Err(RemoteError::Listing {
                    path: dir.to_string(),
                    detail: e.to_string(),
                });
            }
        };

        Ok(entries
            .into_iter()
            .filter_map(|(path, stat)| {
                let filename = path.file_name()?.to_str()?.to_string();
                Some(RemoteEntry {
                    filename,
                    modified: stat
                        .mtime
                        .and_then(|secs| i64::try_from(secs).ok())
                        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
                    size: stat.size,
                    is_dir: stat.is_dir(),
                })
            })
            .collect())
    }

    /// Read a whole remote file into memory.
    ///
    /// A read that fails part-way marks the session broken; the channel
    /// state is unknown after that.
    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>, RemoteError> {
        let fetch_err = |detail: String| RemoteError::Fetch {
            path: path.to_string(),
            detail,
        };

        let mut file = match self.sftp.open(Path::new(path)) {
            Ok(file) => file,
            Err(e) => {
                self.broken |= is_transport_failure(&e);
                return Err(fetch_err(e.to_string()));
            }
        };
        let mut buf = Vec::new();
        if let Err(e) = file.read_to_end(&mut buf) {
            self.broken = true;
            return Err(fetch_err(e.to_string()));
        }
        Ok(buf)
    }

    /// Whether a transport failure has made this session unusable.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Close the SFTP channel and disconnect.
    pub fn close(self) {
        let Self { sftp, session, host, .. } = self;
        drop(sftp);
        if let Err(e) = session.disconnect(None, "closing", None) {
            tracing::debug!(host = %host, error = %e, "SSH disconnect reported an error");
        }
        tracing::info!(host = %host, "Closed SFTP session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_errors_count_as_transport_failures() {
        // LIBSSH2_ERROR_TIMEOUT and LIBSSH2_ERROR_SOCKET_RECV.
        assert!(is_transport_failure(&ssh2::Error::new(
            ErrorCode::Session(-9),
            "timed out"
        )));
        assert!(is_transport_failure(&ssh2::Error::new(
            ErrorCode::Session(-43),
            "socket recv"
        )));
        // LIBSSH2_FX_NO_SUCH_FILE leaves the connection usable.
        assert!(!is_transport_failure(&ssh2::Error::new(
            ErrorCode::SFTP(2),
            "no such file"
        )));
    }
}
