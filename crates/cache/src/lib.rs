//! On-disk artifact cache.
//!
//! Listings are cached per (station, calendar month) bucket as a JSON
//! document refreshed on a time-to-live; image thumbnails (the first few
//! kilobytes of each frame) are cached per filename beneath the bucket.
//!
//! ```text
//! <cache_root>/<station>/<YYYY-MM>/meta_<YYYY-MM>.json
//! <cache_root>/<station>/<YYYY-MM>/thumbs/<original_filename>
//! ```
//!
//! Concurrent refreshes of the same bucket are coalesced so only one
//! remote listing runs at a time per key.

pub mod bucket;
pub mod cache;
pub mod error;
pub mod listing_store;
pub mod singleflight;
pub mod thumbnails;

pub use bucket::MonthKey;
pub use cache::{ArtifactCache, CacheConfig};
pub use error::{CacheError, RemoteFailureKind};
pub use listing_store::MonthListing;
