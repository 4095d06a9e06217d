//! Traits the cache and the loading facade use to reach a station.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use cassandra_core::artifact::{ArtifactRecord, Outcome, ResolutionClass};
use cassandra_core::station::{resolve_key_path, StationRemoteConfig};

use crate::client::RemoteListingClient;
use crate::error::RemoteError;
use crate::session::SessionParams;

/// A station's artifact tree: three listable collections plus byte fetch.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// List one collection, sorted ascending by timestamp.
    async fn list(
        &self,
        class: ResolutionClass,
    ) -> Result<Outcome<Vec<ArtifactRecord>>, RemoteError>;

    /// Read one artifact fully into memory.
    async fn fetch_bytes(&self, remote_path: &str) -> Result<Vec<u8>, RemoteError>;

    /// Release any underlying connection. Later calls may reopen it.
    async fn close(&self) {}
}

/// Builds a live source for a configured station.
pub trait RemoteConnector: Send + Sync {
    fn connect(&self, station: &str, config: &StationRemoteConfig) -> Arc<dyn ArtifactSource>;
}

/// Production connector: one [`RemoteListingClient`] per call, using the
/// process-wide key unless the station names its own.
#[derive(Debug, Clone)]
pub struct SftpConnector {
    pub key_path: Option<PathBuf>,
    pub timeout: Duration,
}

impl SftpConnector {
    /// A concrete client, for callers that need more than [`ArtifactSource`].
    pub fn client(&self, station: &str, config: &StationRemoteConfig) -> RemoteListingClient {
        let params = SessionParams {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            key_path: resolve_key_path(config, self.key_path.as_deref()),
            timeout: self.timeout,
        };
        tracing::debug!(station, host = %config.host, "Creating remote listing client");
        RemoteListingClient::new(station, params, config.normalized_base())
    }
}

impl RemoteConnector for SftpConnector {
    fn connect(&self, station: &str, config: &StationRemoteConfig) -> Arc<dyn ArtifactSource> {
        Arc::new(self.client(station, config))
    }
}
