use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;

use super::snapshot::{CartItemRef, PlainFields, SecureFields, SessionSnapshot};
use crate::config::SessionConfig;
use crate::error::{AccessDenied, SecureStoreError, SessionError};
use crate::store::{KeyValueStore, SecureStore};

/// Reads the secure and plain stores concurrently and merges them.
#[derive(Clone)]
pub struct SessionLoader {
    secure: Arc<dyn SecureStore>,
    plain: Arc<dyn KeyValueStore>,
    keys: SessionConfig,
}

impl SessionLoader {
    pub fn new(
        secure: Arc<dyn SecureStore>,
        plain: Arc<dyn KeyValueStore>,
        keys: SessionConfig,
    ) -> Self {
        Self {
            secure,
            plain,
            keys,
        }
    }

    pub fn keys(&self) -> &SessionConfig {
        &self.keys
    }

    /// Both reads are issued before either is awaited. Returns as soon as the
    /// secure store reports `AccessDenied`; every other failure degrades the
    /// affected fields to absent.
    pub async fn load_initial_data(&self) -> Result<SessionSnapshot, AccessDenied> {
        let secure = self.read_secure();
        let plain = async { Ok::<_, AccessDenied>(self.read_plain().await) };

        let (secure, plain) = tokio::try_join!(secure, plain)?;

        tracing::debug!(
            target: "storefront.session",
            has_token = secure.auth_token.is_some(),
            has_theme = plain.theme.is_some(),
            has_cart = plain.cart_items.is_some(),
            "session snapshot loaded"
        );
        Ok(SessionSnapshot::combined(secure, plain))
    }

    /// Plain-store-only snapshot for use after [`AccessDenied`]. Never fails.
    pub async fn get_fallback_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::fallback(self.read_plain().await)
    }

    async fn read_secure(&self) -> Result<SecureFields, AccessDenied> {
        match self.secure.get_credentials(&self.keys.token_service).await {
            Ok(Some(creds)) => Ok(SecureFields {
                auth_token: Some(creds.secret),
                user_id: Some(creds.username),
            }),
            Ok(None) => Ok(SecureFields::default()),
            Err(SecureStoreError::AccessDenied(reason)) => {
                tracing::warn!(
                    target: "storefront.session",
                    store = self.secure.name(),
                    %reason,
                    "secure store denied access"
                );
                Err(AccessDenied { reason })
            }
            Err(e) => {
                tracing::warn!(
                    target: "storefront.session",
                    store = self.secure.name(),
                    error = %e,
                    "secure store read failed, treating credentials as absent"
                );
                Ok(SecureFields::default())
            }
        }
    }

    async fn read_plain(&self) -> PlainFields {
        let (theme, notifications_enabled, cart_items) = futures::join!(
            self.read_key::<String>(&self.keys.theme_key),
            self.read_key::<bool>(&self.keys.notifications_key),
            self.read_key::<Vec<CartItemRef>>(&self.keys.cart_key),
        );
        PlainFields {
            theme,
            notifications_enabled,
            cart_items,
        }
    }

    async fn read_key<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.plain.get(key).await {
            Ok(v) => v?,
            Err(e) => {
                tracing::warn!(
                    target: "storefront.session",
                    store = self.plain.name(),
                    key,
                    error = %e,
                    "plain store read failed, treating key as absent"
                );
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(
                    target: "storefront.session",
                    key,
                    error = %e,
                    "plain store value has unexpected shape, treating key as absent"
                );
                None
            }
        }
    }

    pub async fn save_credentials(&self, user_id: &str, token: &str) -> Result<bool, SessionError> {
        let saved = self
            .secure
            .save_credentials(&self.keys.token_service, user_id, token)
            .await?;
        Ok(saved)
    }

    pub async fn clear_credentials(&self) -> Result<bool, SessionError> {
        let cleared = self
            .secure
            .reset_credentials(&self.keys.token_service)
            .await?;
        Ok(cleared)
    }

    pub async fn save_theme(&self, theme: &str) -> Result<(), SessionError> {
        self.plain.set(&self.keys.theme_key, json!(theme)).await?;
        Ok(())
    }

    pub async fn save_notifications_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        self.plain
            .set(&self.keys.notifications_key, json!(enabled))
            .await?;
        Ok(())
    }

    /// Quota failures surface here so the caller can report "could not update cart".
    pub async fn save_cart(&self, items: &[CartItemRef]) -> Result<(), SessionError> {
        let value = serde_json::to_value(items).map_err(crate::error::KvStoreError::from)?;
        self.plain.set(&self.keys.cart_key, value).await?;
        Ok(())
    }

    pub async fn clear_preferences(&self) -> Result<(), SessionError> {
        self.plain
            .multi_remove(&[
                self.keys.theme_key.as_str(),
                self.keys.notifications_key.as_str(),
                self.keys.cart_key.as_str(),
            ])
            .await?;
        Ok(())
    }
}
