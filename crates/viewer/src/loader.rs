//! Data loading facade.
//!
//! Picks the source for a station, first applicable wins:
//!
//! 1. the centralized store, when configured and reachable;
//! 2. the remote station, when the registry knows it;
//! 3. the local folder `src_folder/{LoRes,HiRes,Wav}`.
//!
//! Store failures degrade to the next source. Remote failures are fatal:
//! a remote-configured station has no meaningful local folder.

use std::path::Path;
use std::sync::Arc;

use cassandra_core::artifact::{normalize_collection, ArtifactRecord, ResolutionClass};
use cassandra_core::indexer::{index_local_audio, index_local_images};
use cassandra_core::station::StationRegistry;
use cassandra_core::timeline::Timestamped;
use cassandra_core::types::Timestamp;
use cassandra_db::{MetadataStore, PgMetadataStore};
use cassandra_remote::{ArtifactSource, RemoteConnector};

use crate::config::ViewerConfig;
use crate::error::LoadError;

/// Which source produced a [`LoadedData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Store,
    Remote,
    Local,
}

/// The three collections of one station, each ascending by timestamp.
pub struct LoadedData {
    pub lowres: Vec<ArtifactRecord>,
    pub highres: Vec<ArtifactRecord>,
    pub audio: Vec<ArtifactRecord>,
    /// Records carry remote paths rather than local ones.
    pub is_remote: bool,
    /// Live source for byte fetches; only set for a remote station.
    pub client: Option<Arc<dyn ArtifactSource>>,
    pub origin: DataOrigin,
}

impl LoadedData {
    pub fn is_empty(&self) -> bool {
        self.lowres.is_empty() && self.highres.is_empty() && self.audio.is_empty()
    }

    /// Every timestamp across the three collections, ascending.
    pub fn all_timestamps(&self) -> Vec<Timestamp> {
        let mut all: Vec<Timestamp> = self
            .lowres
            .iter()
            .chain(&self.highres)
            .chain(&self.audio)
            .map(Timestamped::timestamp)
            .collect();
        all.sort();
        all
    }

    /// Earliest and latest timestamp across the three collections.
    pub fn span(&self) -> Option<(Timestamp, Timestamp)> {
        let all = self.all_timestamps();
        Some((*all.first()?, *all.last()?))
    }
}

impl std::fmt::Debug for LoadedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedData")
            .field("lowres", &self.lowres.len())
            .field("highres", &self.highres.len())
            .field("audio", &self.audio.len())
            .field("is_remote", &self.is_remote)
            .field("client", &self.client.is_some())
            .field("origin", &self.origin)
            .finish()
    }
}

pub struct DataLoader {
    store: Option<Arc<dyn MetadataStore>>,
    registry: StationRegistry,
    connector: Arc<dyn RemoteConnector>,
}

impl DataLoader {
    pub fn new(registry: StationRegistry, connector: Arc<dyn RemoteConnector>) -> Self {
        Self {
            store: None,
            registry,
            connector,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Wire up the production sources described by `config`.
    ///
    /// A malformed `DATABASE_URL` disables the store with a warning; it
    /// never prevents loading.
    pub fn from_config(config: &ViewerConfig) -> Result<Self, LoadError> {
        let registry = StationRegistry::load(&config.stations_file).map_err(LoadError::Registry)?;
        tracing::info!(
            path = %config.stations_file.display(),
            stations = registry.len(),
            "Loaded station registry",
        );

        let loader = Self::new(registry, Arc::new(config.connector()));
        let Some(url) = config.database_url.as_deref() else {
            return Ok(loader);
        };
        match PgMetadataStore::connect_lazy(url, config.store_timeout()) {
            Ok(store) => Ok(loader.with_store(Arc::new(store))),
            Err(e) => {
                tracing::warn!(error = %e, "Metadata store disabled");
                Ok(loader)
            }
        }
    }

    pub fn registry(&self) -> &StationRegistry {
        &self.registry
    }

    /// A live source for a registry station, or `None` when the station
    /// is not remote.
    pub fn remote_source(&self, station: &str) -> Option<Arc<dyn ArtifactSource>> {
        let config = self.registry.get(station)?;
        Some(self.connector.connect(station, config))
    }

    /// Load the three collections for `station`.
    pub async fn load(&self, station: &str, src_folder: &Path) -> Result<LoadedData, LoadError> {
        if let Some(store) = &self.store {
            if let Some(data) = self.load_from_store(store.as_ref(), station).await {
                return Ok(data);
            }
        }

        if let Some(source) = self.remote_source(station) {
            return self.load_from_remote(source, station).await;
        }

        self.load_from_local(station, src_folder)
    }

    async fn load_from_store(&self, store: &dyn MetadataStore, station: &str) -> Option<LoadedData> {
        let mut collections = Vec::with_capacity(3);
        for class in ResolutionClass::ALL {
            match store.list(station, class).await {
                Ok(outcome) => collections.push(outcome.into_records()),
                Err(e) => {
                    tracing::warn!(station, class = %class, error = %e, "Metadata store failed, falling back");
                    return None;
                }
            }
        }
        if collections.iter().all(Vec::is_empty) {
            tracing::info!(station, "Metadata store has no records for station, falling back");
            return None;
        }

        let audio = collections.pop().unwrap_or_default();
        let highres = collections.pop().unwrap_or_default();
        let lowres = collections.pop().unwrap_or_default();
        tracing::info!(
            station,
            lowres = lowres.len(),
            highres = highres.len(),
            audio = audio.len(),
            "Loaded from metadata store",
        );

        Some(LoadedData {
            lowres: normalize_collection(lowres),
            highres: normalize_collection(highres),
            audio: normalize_collection(audio),
            is_remote: true,
            client: None,
            origin: DataOrigin::Store,
        })
    }

    async fn load_from_remote(
        &self,
        source: Arc<dyn ArtifactSource>,
        station: &str,
    ) -> Result<LoadedData, LoadError> {
        let mut collections = Vec::with_capacity(3);
        for class in ResolutionClass::ALL {
            match source.list(class).await {
                Ok(outcome) => collections.push(normalize_collection(outcome.into_records())),
                Err(e) => {
                    tracing::error!(station, class = %class, error = %e, "Remote listing failed");
                    source.close().await;
                    return Err(LoadError::remote(station, e));
                }
            }
        }

        let audio = collections.pop().unwrap_or_default();
        let highres = collections.pop().unwrap_or_default();
        let lowres = collections.pop().unwrap_or_default();
        tracing::info!(
            station,
            lowres = lowres.len(),
            highres = highres.len(),
            audio = audio.len(),
            "Loaded from remote station",
        );

        Ok(LoadedData {
            lowres,
            highres,
            audio,
            is_remote: true,
            client: Some(source),
            origin: DataOrigin::Remote,
        })
    }

    fn load_from_local(&self, station: &str, src_folder: &Path) -> Result<LoadedData, LoadError> {
        let images = |class: ResolutionClass| -> Result<Vec<ArtifactRecord>, LoadError> {
            let dir = src_folder.join(class.as_str());
            if !dir.is_dir() {
                return Ok(Vec::new());
            }
            let report = index_local_images(&dir).map_err(LoadError::Local)?;
            Ok(report
                .records
                .into_iter()
                .filter(|r| r.station == station)
                .collect())
        };

        let lowres = normalize_collection(images(ResolutionClass::LowRes)?);
        let highres = normalize_collection(images(ResolutionClass::HighRes)?);

        let wav_dir = src_folder.join(ResolutionClass::Audio.as_str());
        let audio = if wav_dir.is_dir() {
            normalize_collection(index_local_audio(&wav_dir, station).map_err(LoadError::Local)?)
        } else {
            Vec::new()
        };

        tracing::info!(
            station,
            folder = %src_folder.display(),
            lowres = lowres.len(),
            highres = highres.len(),
            audio = audio.len(),
            "Loaded from local folder",
        );

        Ok(LoadedData {
            lowres,
            highres,
            audio,
            is_remote: false,
            client: None,
            origin: DataOrigin::Local,
        })
    }
}
