use serde::{Deserialize, Serialize};

/// Reverse-domain namespace shared by every secure-store service key.
pub const SERVICE_NAMESPACE: &str = "com.ecom";

/// Build a namespaced service key, e.g. `com.ecom:userToken`.
pub fn service_key(name: &str) -> String {
    format!("{SERVICE_NAMESPACE}:{name}")
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}
