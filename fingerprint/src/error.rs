use thiserror::Error;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(String),

    #[error("probe not supported: {0}")]
    Unsupported(&'static str),

    #[error("probe failed: {0}")]
    Probe(String),
}
