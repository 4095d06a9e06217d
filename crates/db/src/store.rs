//! Metadata store seam used by the loading facade.

use std::time::Duration;

use async_trait::async_trait;

use cassandra_core::artifact::{normalize_collection, ArtifactRecord, Outcome, ResolutionClass};

use crate::error::StoreError;
use crate::repositories::FrameRepo;
use crate::DbPool;

/// A centralized source of artifact records.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Records for one station and class, ascending by timestamp.
    async fn list(
        &self,
        station: &str,
        class: ResolutionClass,
    ) -> Result<Outcome<Vec<ArtifactRecord>>, StoreError>;
}

/// Postgres-backed store over the `frames` table.
pub struct PgMetadataStore {
    pool: DbPool,
}

impl PgMetadataStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Build a store whose pool connects on first query, so an
    /// unreachable server shows up as a query failure the caller can
    /// recover from.
    pub fn connect_lazy(database_url: &str, acquire_timeout: Duration) -> Result<Self, StoreError> {
        Ok(Self::new(crate::create_lazy_pool(database_url, acquire_timeout)?))
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn list(
        &self,
        station: &str,
        class: ResolutionClass,
    ) -> Result<Outcome<Vec<ArtifactRecord>>, StoreError> {
        let rows = FrameRepo::list_by_station_resolution(&self.pool, station, class.as_str()).await?;
        let records = rows
            .into_iter()
            .map(|row| row.into_record())
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(station, class = %class, count = records.len(), "Listed frames from store");
        Ok(Outcome::from_records(normalize_collection(records)))
    }
}
