use thiserror::Error;

/// Failures reported by a secure credential store.
///
/// "Not found" is not an error: `get_credentials` returns `Ok(None)` for it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecureStoreError {
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Failures reported by a plain key-value store.
#[derive(Error, Debug)]
pub enum KvStoreError {
    #[error("quota exceeded writing `{key}`: need {needed} bytes, limit {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend failure: {0}")]
    Backend(String),
}
