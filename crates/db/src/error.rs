/// Errors from the centralized metadata store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row carried a resolution name outside `LoRes` / `HiRes` / `Wav`.
    #[error("Unknown resolution '{resolution}' for key {key}")]
    UnknownResolution { resolution: String, key: String },
}
