use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Platform application state as reported by the lifecycle signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppLifecycleState {
    Active,
    Inactive,
    Background,
}

/// Platform URI-intent source.
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Launch URI, if the process was started by one.
    async fn initial_url(&self) -> anyhow::Result<Option<String>>;

    /// 进程运行期间到达的 URI
    fn subscribe(&self) -> BoxStream<'static, String>;
}

/// 前后台切换信号；只有 `Active` 会触发补发
pub trait LifecycleSource: Send + Sync {
    fn subscribe(&self) -> BoxStream<'static, AppLifecycleState>;
}

/// Platform URI-opening capability, used for link diagnostics only.
#[async_trait]
pub trait LinkOpener: Send + Sync {
    async fn can_open(&self, url: &str) -> anyhow::Result<bool>;
    async fn open(&self, url: &str) -> anyhow::Result<()>;
    async fn open_in_browser(&self, url: &str) -> anyhow::Result<()>;
}
