use thiserror::Error;

use super::store::{KvStoreError, SecureStoreError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("deep link error: {0}")]
    DeepLink(#[from] DeepLinkError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// The secure store refused access while loading the session.
///
/// Never absorbed by the loader: the caller must fall back explicitly and
/// force re-authentication.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("secure store access denied: {reason}")]
pub struct AccessDenied {
    pub reason: String,
}

/// Errors surfaced by the session loader and its write helpers.
///
/// `load_initial_data` only ever returns [`SessionError::AccessDenied`]; the
/// other variants come from explicit writes where the caller must decide.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("secure store access denied: {0}")]
    AccessDenied(String),
    #[error("plain store error: {0}")]
    Storage(#[from] KvStoreError),
    #[error("secure store error: {0}")]
    Credentials(SecureStoreError),
}

impl From<AccessDenied> for SessionError {
    fn from(e: AccessDenied) -> Self {
        Self::AccessDenied(e.reason)
    }
}

impl SessionError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::Storage(KvStoreError::QuotaExceeded { .. }))
    }
}

impl From<SecureStoreError> for SessionError {
    fn from(e: SecureStoreError) -> Self {
        match e {
            SecureStoreError::AccessDenied(msg) => Self::AccessDenied(msg),
            other => Self::Credentials(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum DeepLinkError {
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    #[error("failed to open url: {0}")]
    Open(String),
}
