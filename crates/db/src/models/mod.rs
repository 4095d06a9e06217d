//! Row structs for the metadata store tables.

pub mod frame;
