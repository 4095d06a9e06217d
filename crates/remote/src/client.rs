//! Remote listing client for one station.
//!
//! Wraps a lazily opened [`RemoteSession`] shared by every listing and
//! fetch until [`RemoteListingClient::close`] is called. SFTP calls block,
//! so each runs on the blocking pool while holding the session lock;
//! concurrent callers are serialized on that lock.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use cassandra_core::artifact::{ArtifactRecord, Outcome, ResolutionClass};

use crate::error::RemoteError;
use crate::listing::entries_to_records;
use crate::mirror::RemoteTree;
use crate::session::{RemoteEntry, RemoteSession, SessionParams};
use crate::source::ArtifactSource;

/// Remote view of one station's `LoRes/`, `HiRes/` and `Wav/` folders.
pub struct RemoteListingClient {
    station: String,
    remote_base: String,
    params: Arc<SessionParams>,
    session: Arc<Mutex<Option<RemoteSession>>>,
}

impl RemoteListingClient {
    /// Create a client. No connection is made until the first call.
    ///
    /// * `remote_base` - normalized root, e.g. `C:/htdocs/VLF`.
    pub fn new(station: impl Into<String>, params: SessionParams, remote_base: String) -> Self {
        Self {
            station: station.into(),
            remote_base,
            params: Arc::new(params),
            session: Arc::new(Mutex::new(None)),
        }
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    /// Remote directory for one collection.
    pub fn remote_dir(&self, class: ResolutionClass) -> String {
        format!("{}/{}", self.remote_base, class.as_str())
    }

    /// Whether a session is currently open.
    pub fn is_open(&self) -> bool {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Open the session now. A second call is a no-op.
    pub async fn open(&self) -> Result<(), RemoteError> {
        self.with_session(|_| Ok(())).await
    }

    /// Close the session if open.
    pub async fn close(&self) {
        let slot = Arc::clone(&self.session);
        let closed = tokio::task::spawn_blocking(move || {
            let taken = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(session) = taken {
                session.close();
            }
        })
        .await;
        if let Err(e) = closed {
            tracing::warn!(station = %self.station, error = %e, "Closing remote session failed");
        }
    }

    /// List one collection under `<remote_base>/<class>`.
    ///
    /// A missing directory is a [`RemoteError::Listing`]; an existing
    /// directory without matching files is [`Outcome::Empty`].
    pub async fn list(
        &self,
        class: ResolutionClass,
    ) -> Result<Outcome<Vec<ArtifactRecord>>, RemoteError> {
        let dir = self.remote_dir(class);
        let entries = self.list_entries(&dir).await?;
        let records = entries_to_records(&entries, class, &dir);

        tracing::debug!(
            station = %self.station,
            class = %class,
            entries = entries.len(),
            records = records.len(),
            "Listed remote collection",
        );

        Ok(Outcome::from_records(records))
    }

    /// Raw entries of any remote directory.
    pub async fn list_entries(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let dir = dir.to_string();
        self.with_session(move |session| session.list_dir(&dir))
            .await
    }

    /// Read one artifact fully into memory.
    pub async fn fetch_bytes(&self, remote_path: &str) -> Result<Vec<u8>, RemoteError> {
        let path = remote_path.to_string();
        self.with_session(move |session| session.read_file(&path))
            .await
    }

    /// Run `op` on the blocking pool against the (possibly new) session.
    /// A session broken by a transport failure is closed so the next call
    /// reconnects.
    async fn with_session<T, F>(&self, op: F) -> Result<T, RemoteError>
    where
        T: Send + 'static,
        F: FnOnce(&mut RemoteSession) -> Result<T, RemoteError> + Send + 'static,
    {
        let params = Arc::clone(&self.params);
        let slot = Arc::clone(&self.session);
        let station = self.station.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            let session = match guard.take() {
                Some(session) => session,
                None => RemoteSession::open(&params)?,
            };
            let result = op(guard.insert(session));
            if guard.as_ref().is_some_and(RemoteSession::is_broken) {
                if let Some(dead) = guard.take() {
                    tracing::warn!(station = %station, "Dropping broken remote session");
                    dead.close();
                }
            }
            result
        })
        .await
        .map_err(|e| RemoteError::Task(e.to_string()))?
    }
}

#[async_trait]
impl ArtifactSource for RemoteListingClient {
    async fn list(
        &self,
        class: ResolutionClass,
    ) -> Result<Outcome<Vec<ArtifactRecord>>, RemoteError> {
        RemoteListingClient::list(self, class).await
    }

    async fn fetch_bytes(&self, remote_path: &str) -> Result<Vec<u8>, RemoteError> {
        RemoteListingClient::fetch_bytes(self, remote_path).await
    }

    async fn close(&self) {
        RemoteListingClient::close(self).await
    }
}

#[async_trait]
impl RemoteTree for RemoteListingClient {
    async fn list_entries(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        RemoteListingClient::list_entries(self, dir).await
    }

    async fn fetch_bytes(&self, remote_path: &str) -> Result<Vec<u8>, RemoteError> {
        RemoteListingClient::fetch_bytes(self, remote_path).await
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;

    fn unreachable_client() -> RemoteListingClient {
        // Port 1 on loopback refuses connections immediately.
        let params = SessionParams {
            host: "127.0.0.1".into(),
            port: 1,
            username: "vlf".into(),
            key_path: PathBuf::from("/nonexistent/id_ed25519"),
            timeout: Duration::from_secs(2),
        };
        RemoteListingClient::new("ExperimentalG4", params, "C:/htdocs/VLF".into())
    }

    #[test]
    fn remote_dirs_follow_station_layout() {
        let client = unreachable_client();
        assert_eq!(client.remote_dir(ResolutionClass::LowRes), "C:/htdocs/VLF/LoRes");
        assert_eq!(client.remote_dir(ResolutionClass::HighRes), "C:/htdocs/VLF/HiRes");
        assert_eq!(client.remote_dir(ResolutionClass::Audio), "C:/htdocs/VLF/Wav");
    }

    #[tokio::test]
    async fn construction_is_lazy() {
        let client = unreachable_client();
        assert!(!client.is_open());
        client.close().await;
        assert!(!client.is_open());
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_failure() {
        let client = unreachable_client();

        assert_matches!(client.open().await, Err(RemoteError::Connection { .. }));
        let err = client.list(ResolutionClass::LowRes).await.unwrap_err();
        assert!(err.is_connection());
        assert_matches!(
            client.fetch_bytes("C:/htdocs/VLF/LoRes/a.jpg").await,
            Err(RemoteError::Connection { .. })
        );
        assert!(!client.is_open());
    }
}
