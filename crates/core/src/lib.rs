//! Core types and pure logic shared by every Cassandra crate.
//!
//! Holds the artifact data model, the filename parser, the local
//! directory indexer, the station registry and the timeline helpers used
//! to select frames and clips for a time window.

pub mod artifact;
pub mod error;
pub mod indexer;
pub mod parser;
pub mod station;
pub mod timeline;
pub mod types;
