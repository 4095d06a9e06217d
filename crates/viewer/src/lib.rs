//! Viewer-facing layer: the data loading facade, explicit view state and
//! the pieces the `cassandra` binary drives.

pub mod config;
pub mod error;
pub mod inference;
pub mod loader;
pub mod state;

pub use config::ViewerConfig;
pub use error::LoadError;
pub use loader::{DataLoader, DataOrigin, LoadedData};
pub use state::{ControlMode, HourStep, ViewState, WindowSelection};
