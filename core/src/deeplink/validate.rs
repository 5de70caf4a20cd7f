use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::types::DeepLinkEvent;

pub const FALLBACK_ROUTE: &str = "fallback";

lazy_static! {
    // 仅 ASCII：`\d` 会匹配其他 Unicode 数字
    static ref PRODUCT_ID_RE: Regex = Regex::new(r"^[0-9]+$").unwrap();
    static ref USER_ID_RE: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    InvalidProductId,
    InvalidUserId,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidProductId => "invalid_product_id",
            Self::InvalidUserId => "invalid_user_id",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidProductId => "Invalid product ID format",
            Self::InvalidUserId => "Invalid user ID format",
        }
    }
}

/// 校验失败的原因及原始路由
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub original_route: String,
}

impl Rejection {
    /// Synthetic `fallback` event that replaces the rejected one.
    pub fn fallback_event(&self, rejected: &DeepLinkEvent) -> DeepLinkEvent {
        let mut params = BTreeMap::new();
        params.insert("reason".to_string(), self.reason.as_str().to_string());
        params.insert("originalRoute".to_string(), self.original_route.clone());
        params.insert("message".to_string(), self.reason.message().to_string());
        DeepLinkEvent::new(
            rejected.source_url(),
            FALLBACK_ROUTE,
            params,
            rejected.origin(),
        )
    }
}

/// Route-specific identifier checks. Routes without a rule always pass.
pub fn validate_event(event: &DeepLinkEvent) -> Result<(), Rejection> {
    let failed = match event.route() {
        "product" => event
            .id()
            .filter(|id| !PRODUCT_ID_RE.is_match(id))
            .map(|_| RejectionReason::InvalidProductId),
        "profile" => event
            .user_id()
            .filter(|user_id| !USER_ID_RE.is_match(user_id))
            .map(|_| RejectionReason::InvalidUserId),
        _ => None,
    };

    match failed {
        Some(reason) => Err(Rejection {
            reason,
            original_route: event.route().to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deeplink::{DeepLinkParser, LinkOrigin};

    fn check(url: &str) -> Result<(), Rejection> {
        let ev = DeepLinkParser::default()
            .parse(url, LinkOrigin::WarmStart)
            .unwrap();
        validate_event(&ev)
    }

    #[test]
    fn product_without_id_param_passes() {
        assert!(check("ecommerceapp://product/404").is_ok());
    }

    #[test]
    fn product_id_must_be_ascii_digits() {
        assert!(check("ecommerceapp://product/id/123").is_ok());
        let err = check("ecommerceapp://product/id/abc").unwrap_err();
        assert_eq!(err.reason, RejectionReason::InvalidProductId);
        assert!(check("ecommerceapp://product/id/%D9%A3").is_err());
        assert!(check("ecommerceapp://product/id/1?id=%D9%A3").is_err());
        assert!(check("ecommerceapp://product?id=").is_err());
    }

    #[test]
    fn trailing_fragment_does_not_bypass_id_checks() {
        let err = check("ecommerceapp://product/id/12#../admin").unwrap_err();
        assert_eq!(err.reason, RejectionReason::InvalidProductId);
        let err = check("ecommerceapp://product?id=12#x").unwrap_err();
        assert_eq!(err.reason, RejectionReason::InvalidProductId);
        let err = check("ecommerceapp://profile/userId/abc#frag").unwrap_err();
        assert_eq!(err.reason, RejectionReason::InvalidUserId);
    }

    #[test]
    fn user_id_charset() {
        assert!(check("https://miniecommerce.com/profile/userId/mary_jane").is_ok());
        assert!(check("ecommerceapp://profile/userId/a-b_9").is_ok());
        let err = check("ecommerceapp://profile/userId/user@123").unwrap_err();
        assert_eq!(err.reason, RejectionReason::InvalidUserId);
        assert_eq!(err.original_route, "profile");
    }

    #[test]
    fn other_routes_always_pass() {
        assert!(check("ecommerceapp://cart/id/abc").is_ok());
        assert!(check("ecommerceapp://settings/userId/@@").is_ok());
    }

    #[test]
    fn fallback_event_carries_reason() {
        let ev = DeepLinkParser::default()
            .parse("ecommerceapp://product/id/abc", LinkOrigin::ColdStart)
            .unwrap();
        let rejection = validate_event(&ev).unwrap_err();
        let fb = rejection.fallback_event(&ev);

        assert_eq!(fb.route(), "fallback");
        assert_eq!(fb.fallback_reason(), Some("invalid_product_id"));
        assert_eq!(fb.param("originalRoute"), Some("product"));
        assert_eq!(fb.param("message"), Some("Invalid product ID format"));
        assert_eq!(fb.origin(), LinkOrigin::ColdStart);
        assert_eq!(fb.source_url(), ev.source_url());
    }
}
