use std::collections::BTreeMap;

use super::decode::percent_decode;
use super::types::{DeepLinkEvent, LinkOrigin};
use crate::config::DeepLinkConfig;

const DEFAULT_ROUTE: &str = "home";

/// Normalizes the two recognised URL forms into `(route, params)`.
#[derive(Debug, Clone)]
pub struct DeepLinkParser {
    custom_scheme_prefix: String,
    universal_link_prefix: String,
}

impl Default for DeepLinkParser {
    fn default() -> Self {
        Self::from_config(&DeepLinkConfig::default())
    }
}

impl DeepLinkParser {
    pub fn new(
        custom_scheme_prefix: impl Into<String>,
        universal_link_prefix: impl Into<String>,
    ) -> Self {
        Self {
            custom_scheme_prefix: custom_scheme_prefix.into(),
            universal_link_prefix: universal_link_prefix.into(),
        }
    }

    pub fn from_config(cfg: &DeepLinkConfig) -> Self {
        Self::new(&cfg.custom_scheme_prefix, &cfg.universal_link_prefix)
    }

    pub fn custom_scheme_prefix(&self) -> &str {
        &self.custom_scheme_prefix
    }

    pub fn universal_link_prefix(&self) -> &str {
        &self.universal_link_prefix
    }

    pub fn is_supported(&self, url: &str) -> bool {
        self.strip_prefix(url).is_some()
    }

    fn strip_prefix<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.custom_scheme_prefix.as_str())
            .or_else(|| url.strip_prefix(self.universal_link_prefix.as_str()))
    }

    /// `None` when the URL matches neither prefix.
    ///
    /// Path segments after the route pair up as `key/value` starting at index 1;
    /// a trailing unpaired segment is dropped. `add-to-cart/<id>` additionally
    /// sets `productId` and `action`. Query parameters are merged last.
    /// A `#` has no special meaning and stays in the segment or value.
    pub fn parse(&self, url: &str, origin: LinkOrigin) -> Option<DeepLinkEvent> {
        let rest = self.strip_prefix(url)?;
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let route = segments.first().copied().unwrap_or(DEFAULT_ROUTE);

        let mut params = BTreeMap::new();
        for pair in segments.get(1..).unwrap_or_default().chunks_exact(2) {
            params.insert(pair[0].to_string(), pair[1].to_string());
        }

        if route == "add-to-cart" {
            if let Some(product_id) = segments.get(1) {
                params.insert("productId".to_string(), product_id.to_string());
                params.insert("action".to_string(), "add_to_cart".to_string());
            }
        }

        if let Some(query) = query {
            for part in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                let key = percent_decode(key).unwrap_or_else(|| key.to_string());
                let value = percent_decode(value).unwrap_or_else(|| value.to_string());
                params.insert(key, value);
            }
        }

        Some(DeepLinkEvent::new(url, route, params, origin))
    }

    /// Custom-scheme URL for `route` followed by raw path segments.
    pub fn link_for(&self, route: &str, segments: &[&str]) -> String {
        build_link(&self.custom_scheme_prefix, route, segments)
    }
}

pub fn build_link(prefix: &str, route: &str, segments: &[&str]) -> String {
    let mut url = format!("{prefix}{route}");
    for segment in segments {
        url.push('/');
        url.push_str(segment);
    }
    url
}
