//! 深链事件与路由器状态类型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 事件来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkOrigin {
    /// 进程由该 URI 冷启动
    ColdStart,
    /// 进程已在运行
    WarmStart,
}

/// 已知路由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnownRoute {
    Home,
    Product,
    Profile,
    Cart,
    Products,
    AddToCart,
    Login,
    Settings,
    Analytics,
    /// 校验失败时合成的保留路由
    Fallback,
    Other(String),
}

impl KnownRoute {
    pub fn parse(route: &str) -> Self {
        match route {
            "home" => Self::Home,
            "product" => Self::Product,
            "profile" => Self::Profile,
            "cart" => Self::Cart,
            "products" => Self::Products,
            "add-to-cart" => Self::AddToCart,
            "login" => Self::Login,
            "settings" => Self::Settings,
            "analytics" => Self::Analytics,
            "fallback" => Self::Fallback,
            other => Self::Other(other.to_string()),
        }
    }
}

/// 一次解析后的导航意图，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepLinkEvent {
    source_url: String,
    route: String,
    params: BTreeMap<String, String>,
    occurred_at: DateTime<Utc>,
    origin: LinkOrigin,
}

impl DeepLinkEvent {
    pub fn new(
        source_url: impl Into<String>,
        route: impl Into<String>,
        params: BTreeMap<String, String>,
        origin: LinkOrigin,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            route: route.into(),
            params,
            occurred_at: Utc::now(),
            origin,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn known_route(&self) -> KnownRoute {
        KnownRoute::parse(&self.route)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn origin(&self) -> LinkOrigin {
        self.origin
    }

    pub fn id(&self) -> Option<&str> {
        self.param("id")
    }

    pub fn user_id(&self) -> Option<&str> {
        self.param("userId")
    }

    pub fn product_id(&self) -> Option<&str> {
        self.param("productId")
    }

    pub fn action(&self) -> Option<&str> {
        self.param("action")
    }

    /// Only set on `fallback` events.
    pub fn fallback_reason(&self) -> Option<&str> {
        if self.route == "fallback" {
            self.param("reason")
        } else {
            None
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.route == "fallback"
    }
}

/// 延迟动作负载
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPayload {
    pub product_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Intent queued while no listener could take it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: Uuid,
    pub kind: String,
    pub payload: PendingPayload,
}

impl PendingAction {
    pub fn new(kind: impl Into<String>, product_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            payload: PendingPayload {
                product_id: product_id.into(),
                timestamp: Utc::now(),
            },
        }
    }

    /// `add_to_cart` 对应路由 `add-to-cart`
    pub fn route(&self) -> String {
        self.kind.replace('_', "-")
    }
}

/// 路由器生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouterPhase {
    Uninitialized,
    Initializing,
    Ready,
}

/// 路由器健康快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterStatus {
    pub initialized: bool,
    pub listener_count: usize,
    pub pending_action_count: usize,
    pub platform: String,
}
