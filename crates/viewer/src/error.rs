use cassandra_core::error::CoreError;
use cassandra_remote::RemoteError;

/// Failures of the loading facade that reach the caller.
///
/// Store errors never appear here: they are logged and the next source
/// is tried.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Could not connect to station {station}: {source}")]
    Connection {
        station: String,
        #[source]
        source: RemoteError,
    },

    #[error("Could not list station {station}: {source}")]
    Listing {
        station: String,
        #[source]
        source: RemoteError,
    },

    #[error("Local index failed: {0}")]
    Local(#[source] CoreError),

    #[error("Station registry could not be loaded: {0}")]
    Registry(#[source] CoreError),
}

impl LoadError {
    /// Classify a remote failure raised while listing `station`.
    pub(crate) fn remote(station: &str, source: RemoteError) -> Self {
        if source.is_connection() {
            Self::Connection {
                station: station.to_string(),
                source,
            }
        } else {
            Self::Listing {
                station: station.to_string(),
                source,
            }
        }
    }
}
