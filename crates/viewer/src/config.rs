//! Process configuration, read once at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;

use cassandra_cache::CacheConfig;
use cassandra_core::station::{expand_home, DEFAULT_KEY_PATH};
use cassandra_remote::SftpConnector;

/// Viewer configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Station registry file (default: `stations.yml`).
    pub stations_file: PathBuf,
    /// Private key used for every station without its own (default: `~/.ssh/id_ed25519`).
    pub ssh_key_path: PathBuf,
    /// Centralized store. `None` skips that source entirely.
    pub database_url: Option<String>,
    /// Cache root (default: `~/.vlf_cache`).
    pub cache_dir: PathBuf,
    pub cache_ttl_secs: u64,
    pub thumb_max_bytes: usize,
    pub thumb_workers: usize,
    /// TCP connect and SSH operation timeout.
    pub remote_timeout_secs: u64,
    /// Store pool acquire timeout.
    pub store_timeout_secs: u64,
}

impl ViewerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default             |
    /// |-----------------------|---------------------|
    /// | `STATIONS_FILE`       | `stations.yml`      |
    /// | `SSH_KEY_PATH`        | `~/.ssh/id_ed25519` |
    /// | `DATABASE_URL`        | unset               |
    /// | `CACHE_DIR`           | `~/.vlf_cache`      |
    /// | `CACHE_TTL_SECS`      | `3600`              |
    /// | `THUMB_MAX_BYTES`     | `32000`             |
    /// | `THUMB_WORKERS`       | `8`                 |
    /// | `REMOTE_TIMEOUT_SECS` | `30`                |
    /// | `STORE_TIMEOUT_SECS`  | `5`                 |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let stations_file: PathBuf = lookup("STATIONS_FILE")
            .unwrap_or_else(|| "stations.yml".into())
            .into();

        let ssh_key_path = expand_home(
            &lookup("SSH_KEY_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_PATH)),
        );

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let cache_dir = expand_home(
            &lookup("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("~/.vlf_cache")),
        );

        Self {
            stations_file,
            ssh_key_path,
            database_url,
            cache_dir,
            cache_ttl_secs: parse_or(&lookup, "CACHE_TTL_SECS", 3600),
            thumb_max_bytes: parse_or(&lookup, "THUMB_MAX_BYTES", 32_000),
            thumb_workers: parse_or(&lookup, "THUMB_WORKERS", 8),
            remote_timeout_secs: parse_or(&lookup, "REMOTE_TIMEOUT_SECS", 30),
            store_timeout_secs: parse_or(&lookup, "STORE_TIMEOUT_SECS", 5),
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            root: self.cache_dir.clone(),
            ttl: TimeDelta::seconds(i64::try_from(self.cache_ttl_secs).unwrap_or(i64::MAX)),
            thumb_max_bytes: self.thumb_max_bytes,
            thumb_workers: self.thumb_workers.max(1),
        }
    }

    pub fn connector(&self) -> SftpConnector {
        SftpConnector {
            key_path: Some(self.ssh_key_path.clone()),
            timeout: Duration::from_secs(self.remote_timeout_secs),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

/// Parse `key`, falling back to `default` (with a warning) when it is
/// unset or malformed.
fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Ignoring malformed setting");
            default
        }),
    }
}
