//! Static station registry.
//!
//! Maps a station identifier to the SSH connection descriptor of the
//! machine that stores its output. Loaded once at startup from a YAML
//! document and passed by reference to whatever needs it:
//!
//! ```yaml
//! ExperimentalG4:
//!   host: 100.76.133.15
//!   port: 22
//!   username: User
//!   remote_base: C:/htdocs/VLF
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::artifact::ResolutionClass;
use crate::error::CoreError;

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Key used when neither the station nor the environment names one.
pub const DEFAULT_KEY_PATH: &str = "~/.ssh/id_ed25519";

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

/// Connection descriptor for one station.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StationRemoteConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    /// Root folder holding `LoRes/`, `HiRes/` and `Wav/`.
    pub remote_base: String,
    /// Per-station private key; overrides the process-wide credential.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

impl StationRemoteConfig {
    /// Remote root with forward slashes and no trailing separator.
    pub fn normalized_base(&self) -> String {
        normalize_remote_path(&self.remote_base)
    }

    /// Remote directory holding one resolution class.
    pub fn remote_dir(&self, class: ResolutionClass) -> String {
        format!("{}/{}", self.normalized_base(), class.as_str())
    }
}

/// Immutable station -> descriptor table.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: BTreeMap<String, StationRemoteConfig>,
}

impl StationRegistry {
    /// Parse a registry document.
    pub fn from_yaml_str(raw: &str) -> Result<Self, CoreError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let stations: BTreeMap<String, StationRemoteConfig> = serde_yaml::from_str(raw)
            .map_err(|e| CoreError::Config(format!("Invalid station registry: {e}")))?;

        for (id, cfg) in &stations {
            if cfg.host.trim().is_empty() {
                return Err(CoreError::Validation(format!("Station '{id}' has an empty host")));
            }
            if cfg.remote_base.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "Station '{id}' has an empty remote_base"
                )));
            }
        }

        Ok(Self { stations })
    }

    /// Load the registry file. A missing file yields an empty registry so
    /// local-only deployments need no configuration.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_yaml_str(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No station registry found; remote listing disabled");
                Ok(Self::default())
            }
            Err(e) => Err(CoreError::io(path, e)),
        }
    }

    pub fn get(&self, station: &str) -> Option<&StationRemoteConfig> {
        self.stations.get(station)
    }

    pub fn contains(&self, station: &str) -> bool {
        self.stations.contains_key(station)
    }

    /// Configured station identifiers, sorted.
    pub fn station_ids(&self) -> impl Iterator<Item = &str> {
        self.stations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Use forward slashes throughout and drop a trailing separator.
pub fn normalize_remote_path(path: &str) -> String {
    let replaced = path.replace('\\', "/");
    match replaced.trim_end_matches('/') {
        "" if replaced.starts_with('/') => "/".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Expand a leading `~` using `$HOME`.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Pick the private key for a station: station override, then the
/// process-wide key, then [`DEFAULT_KEY_PATH`].
pub fn resolve_key_path(station: &StationRemoteConfig, process_key: Option<&Path>) -> PathBuf {
    let chosen = station
        .key_path
        .as_deref()
        .or(process_key)
        .unwrap_or(Path::new(DEFAULT_KEY_PATH));
    expand_home(chosen)
}
