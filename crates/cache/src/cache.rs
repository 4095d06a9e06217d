//! The artifact cache: refresh-or-serve month listings plus thumbnails.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};

use cassandra_core::artifact::{normalize_collection, ArtifactRecord, ResolutionClass};
use cassandra_core::types::Timestamp;
use cassandra_remote::ArtifactSource;

use crate::bucket::{is_safe_component, CacheLayout, MonthKey};
use crate::error::CacheError;
use crate::listing_store::{read_listing, write_listing, MonthListing};
use crate::singleflight::SingleFlight;
use crate::thumbnails::{populate_missing, read_thumbnail};

/// Default listing time-to-live.
pub const DEFAULT_TTL_SECS: i64 = 3600;
/// Default thumbnail byte budget.
pub const DEFAULT_THUMB_MAX_BYTES: usize = 32_000;
/// Default thumbnail fetch fan-out.
pub const DEFAULT_THUMB_WORKERS: usize = 8;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub root: PathBuf,
    pub ttl: TimeDelta,
    pub thumb_max_bytes: usize,
    pub thumb_workers: usize,
}

impl CacheConfig {
    /// Defaults for everything but the root directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ttl: TimeDelta::seconds(DEFAULT_TTL_SECS),
            thumb_max_bytes: DEFAULT_THUMB_MAX_BYTES,
            thumb_workers: DEFAULT_THUMB_WORKERS,
        }
    }
}

type RefreshResult = Result<Arc<MonthListing>, CacheError>;

/// Per (station, month) listing cache backed by the filesystem.
pub struct ArtifactCache {
    config: CacheConfig,
    layout: CacheLayout,
    refreshes: SingleFlight<(String, MonthKey), RefreshResult>,
}

impl ArtifactCache {
    pub fn new(config: CacheConfig) -> Self {
        let layout = CacheLayout::new(config.root.clone());
        Self {
            config,
            layout,
            refreshes: SingleFlight::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Serve the bucket's listing if fresh, otherwise refresh it from
    /// `source`. Concurrent misses on one bucket share a single refresh.
    pub async fn get_month_listing(
        &self,
        source: &dyn ArtifactSource,
        station: &str,
        month: MonthKey,
    ) -> Result<Arc<MonthListing>, CacheError> {
        if !is_safe_component(station) {
            return Err(CacheError::InvalidKey(station.to_string()));
        }
        if let Some(listing) = self.read_fresh(station, month).await? {
            tracing::debug!(station, month = %month, "Serving cached listing");
            return Ok(Arc::new(listing));
        }

        self.refreshes
            .run((station.to_string(), month), || {
                self.refresh_if_stale(source, station, month)
            })
            .await
    }

    /// Cached thumbnail bytes or `None`. Never touches the network.
    pub async fn load_thumbnail(
        &self,
        station: &str,
        timestamp: Timestamp,
        filename: &str,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        read_thumbnail(
            &self.layout,
            station,
            MonthKey::from_timestamp(timestamp),
            filename,
        )
        .await
    }

    /// The persisted listing if present, readable and within the TTL. A
    /// corrupt file counts as stale.
    async fn read_fresh(
        &self,
        station: &str,
        month: MonthKey,
    ) -> Result<Option<MonthListing>, CacheError> {
        let path = self.layout.listing_path(station, month);
        let listing = match read_listing(&path).await {
            Ok(listing) => listing,
            Err(e @ CacheError::Corrupt { .. }) => {
                tracing::warn!(error = %e, "Discarding unreadable cached listing");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(listing.filter(|l| l.is_fresh(Utc::now(), self.config.ttl)))
    }

    async fn refresh_if_stale(
        &self,
        source: &dyn ArtifactSource,
        station: &str,
        month: MonthKey,
    ) -> RefreshResult {
        // A refresh that finished between our read and taking the key.
        if let Some(listing) = self.read_fresh(station, month).await? {
            return Ok(Arc::new(listing));
        }
        self.refresh(source, station, month).await.map(Arc::new)
    }

    /// List both image classes, keep this month, persist, then fill in
    /// missing thumbnails before returning.
    async fn refresh(
        &self,
        source: &dyn ArtifactSource,
        station: &str,
        month: MonthKey,
    ) -> Result<MonthListing, CacheError> {
        tracing::info!(station, month = %month, "Refreshing month listing");

        let mut records: Vec<ArtifactRecord> = Vec::new();
        for class in ResolutionClass::IMAGES {
            let outcome = source.list(class).await.map_err(|e| {
                tracing::error!(station, class = %class, error = %e, "Remote listing failed");
                CacheError::from(e)
            })?;
            let in_month = outcome
                .into_records()
                .into_iter()
                .filter(|r| month.contains(r.timestamp))
                .collect();
            records.extend(normalize_collection(in_month));
        }
        records.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.original_filename.cmp(&b.original_filename))
        });

        let listing = MonthListing {
            station: station.to_string(),
            month: month.to_string(),
            fetched_at: Utc::now(),
            records,
        };
        write_listing(&self.layout.listing_path(station, month), &listing).await?;
        tracing::info!(
            station,
            month = %month,
            records = listing.records.len(),
            "Persisted month listing",
        );

        populate_missing(
            source,
            &self.layout,
            station,
            month,
            &listing.records,
            self.config.thumb_max_bytes,
            self.config.thumb_workers,
        )
        .await;

        Ok(listing)
    }
}
