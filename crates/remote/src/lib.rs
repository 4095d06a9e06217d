//! Remote station access over SSH + SFTP.
//!
//! A [`client::RemoteListingClient`] exposes one station's remote tree as
//! three logical collections (LowRes frames, HighRes frames, audio clips)
//! and fetches artifact bytes on demand over a single lazily opened
//! [`session::RemoteSession`]. The [`source::ArtifactSource`] trait is the
//! seam the cache and the loading facade depend on.

pub mod client;
pub mod error;
pub mod listing;
pub mod mirror;
pub mod session;
pub mod source;

pub use client::RemoteListingClient;
pub use error::RemoteError;
pub use source::{ArtifactSource, RemoteConnector, SftpConnector};
