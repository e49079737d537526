use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to reach the catalog: {0}")]
    Network(String),

    #[error("Show not found: {0}")]
    NotFound(String),

    #[error("Malformed catalog response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend data error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not authenticated")]
    AuthenticationRequired,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Error)]
pub enum AudioError {
    #[error("Output stream error: {0}")]
    OutputStream(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Sink error: {0}")]
    Sink(String),
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type BackendResult<T> = std::result::Result<T, BackendError>;
