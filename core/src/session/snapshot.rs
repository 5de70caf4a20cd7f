use serde::{Deserialize, Deserializer, Serialize};

/// Which stores a snapshot was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// Both stores were consulted (individual fields may still be absent).
    Combined,
    /// Plain store only, after the secure store denied access.
    Fallback,
}

/// One cart line as persisted in the plain store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRef {
    #[serde(deserialize_with = "string_or_number")]
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

// Older cart payloads stored numeric product ids.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

impl CartItemRef {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Fields sourced exclusively from the secure store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecureFields {
    pub auth_token: Option<String>,
    pub user_id: Option<String>,
}

/// Fields sourced exclusively from the plain store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainFields {
    pub theme: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub cart_items: Option<Vec<CartItemRef>>,
}

/// Merged result of one initialization pass. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    auth_token: Option<String>,
    user_id: Option<String>,
    theme: Option<String>,
    notifications_enabled: Option<bool>,
    cart_items: Option<Vec<CartItemRef>>,
    source: SnapshotSource,
}

impl SessionSnapshot {
    pub fn combined(secure: SecureFields, plain: PlainFields) -> Self {
        Self {
            auth_token: secure.auth_token,
            user_id: secure.user_id,
            theme: plain.theme,
            notifications_enabled: plain.notifications_enabled,
            cart_items: plain.cart_items,
            source: SnapshotSource::Combined,
        }
    }

    /// Secure fields are forced absent.
    pub fn fallback(plain: PlainFields) -> Self {
        Self {
            source: SnapshotSource::Fallback,
            ..Self::combined(SecureFields::default(), plain)
        }
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    pub fn notifications_enabled(&self) -> Option<bool> {
        self.notifications_enabled
    }

    pub fn cart_items(&self) -> Option<&[CartItemRef]> {
        self.cart_items.as_deref()
    }

    pub fn source(&self) -> SnapshotSource {
        self.source
    }

    pub fn is_fallback(&self) -> bool {
        self.source == SnapshotSource::Fallback
    }

    pub fn has_credentials(&self) -> bool {
        self.auth_token.is_some() && self.user_id.is_some()
    }
}
