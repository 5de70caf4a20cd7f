//! 深链路由器
//!
//! 由应用根显式构造并持有，不是全局单例。监听者列表、待处理队列和初始化标志
//! 只由路由器自身修改；锁不会跨越 `.await` 持有。

use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinHandle;

use super::parser::DeepLinkParser;
use super::source::{AppLifecycleState, LifecycleSource, LinkOpener, LinkSource};
use super::types::{DeepLinkEvent, LinkOrigin, PendingAction, RouterPhase, RouterStatus};
use super::validate::{validate_event, Rejection};
use crate::config::DeepLinkConfig;

type Listener = Arc<dyn Fn(&DeepLinkEvent) -> anyhow::Result<()> + Send + Sync>;

/// 深链路由器
#[derive(Clone)]
pub struct DeepLinkRouter {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    parser: DeepLinkParser,
    drain_delay: Duration,
    links: Arc<dyn LinkSource>,
    lifecycle: Arc<dyn LifecycleSource>,
    opener: Option<Arc<dyn LinkOpener>>,
    state: Mutex<RouterState>,
}

struct RouterState {
    phase: RouterPhase,
    /// 注册顺序即通知顺序
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
    pending: VecDeque<PendingAction>,
    /// Set while a drain is delivering; nested drains leave the queue alone.
    draining: bool,
    /// URI 流与前台信号的订阅任务
    subscriptions: Vec<JoinHandle<()>>,
}

impl RouterInner {
    fn state(&self) -> MutexGuard<'_, RouterState> {
        // 回调在锁外执行，毒化不会留下半更新的状态
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for RouterInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        for task in state.subscriptions.drain(..) {
            task.abort();
        }
    }
}

/// 注册监听者时返回的句柄；`unsubscribe` 可重复调用
#[derive(Clone)]
pub struct ListenerHandle {
    id: u64,
    router: Weak<RouterInner>,
}

impl ListenerHandle {
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.router.upgrade() {
            inner.state().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle").field("id", &self.id).finish()
    }
}

impl DeepLinkRouter {
    pub fn new(
        cfg: &DeepLinkConfig,
        links: Arc<dyn LinkSource>,
        lifecycle: Arc<dyn LifecycleSource>,
    ) -> Self {
        Self::build(cfg, links, lifecycle, None)
    }

    /// 附加链接打开能力（仅用于 `test_deep_link`）
    pub fn with_opener(
        cfg: &DeepLinkConfig,
        links: Arc<dyn LinkSource>,
        lifecycle: Arc<dyn LifecycleSource>,
        opener: Arc<dyn LinkOpener>,
    ) -> Self {
        Self::build(cfg, links, lifecycle, Some(opener))
    }

    fn build(
        cfg: &DeepLinkConfig,
        links: Arc<dyn LinkSource>,
        lifecycle: Arc<dyn LifecycleSource>,
        opener: Option<Arc<dyn LinkOpener>>,
    ) -> Self {
        let inner = RouterInner {
            parser: DeepLinkParser::from_config(cfg),
            drain_delay: Duration::from_millis(cfg.pending_drain_delay_ms),
            links,
            lifecycle,
            opener,
            state: Mutex::new(RouterState {
                phase: RouterPhase::Uninitialized,
                listeners: Vec::new(),
                next_listener_id: 0,
                pending: VecDeque::new(),
                draining: false,
                subscriptions: Vec::new(),
            }),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Parser built from the same config as the router.
    pub fn parser(&self) -> &DeepLinkParser {
        &self.inner.parser
    }

    pub fn phase(&self) -> RouterPhase {
        self.inner.state().phase
    }

    /// 订阅 URI 流与前台信号，然后处理冷启动 URI。`Ready` 状态下重复调用无效。
    pub async fn initialize(&self) {
        {
            let mut state = self.inner.state();
            if state.phase != RouterPhase::Uninitialized {
                tracing::debug!(
                    target: "storefront.deeplink",
                    phase = ?state.phase,
                    "initialize skipped"
                );
                return;
            }
            state.phase = RouterPhase::Initializing;
        }
        tracing::info!(target: "storefront.deeplink", "router initializing");

        // (1) 后续 URI
        let mut links = self.inner.links.subscribe();
        let weak = Arc::downgrade(&self.inner);
        let link_task = tokio::spawn(async move {
            while let Some(url) = links.next().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                DeepLinkRouter { inner }.handle_url(&url, LinkOrigin::WarmStart);
            }
        });

        // (2) 回到前台时补发待处理动作
        let mut lifecycle = self.inner.lifecycle.subscribe();
        let weak = Arc::downgrade(&self.inner);
        let lifecycle_task = tokio::spawn(async move {
            while let Some(app_state) = lifecycle.next().await {
                if app_state != AppLifecycleState::Active {
                    continue;
                }
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                DeepLinkRouter { inner }.drain_pending_actions();
            }
        });

        self.inner
            .state()
            .subscriptions
            .extend([link_task, lifecycle_task]);

        // (3) 冷启动 URI
        match self.inner.links.initial_url().await {
            Ok(Some(url)) => {
                self.handle_url(&url, LinkOrigin::ColdStart);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    target: "storefront.deeplink",
                    error = %e,
                    "failed to read initial url"
                );
            }
        }

        let mut state = self.inner.state();
        // cleanup() 可能在等待期间发生
        if state.phase == RouterPhase::Initializing {
            state.phase = RouterPhase::Ready;
            tracing::info!(target: "storefront.deeplink", "router ready");
        }
    }

    /// Clears listeners, the pending queue and the phase, and aborts both
    /// platform subscriptions.
    pub fn cleanup(&self) {
        let mut state = self.inner.state();
        for task in state.subscriptions.drain(..) {
            task.abort();
        }
        state.listeners.clear();
        state.pending.clear();
        state.phase = RouterPhase::Uninitialized;
        tracing::info!(target: "storefront.deeplink", "router cleaned up");
    }

    pub fn parse(&self, url: &str, origin: LinkOrigin) -> Option<DeepLinkEvent> {
        self.inner.parser.parse(url, origin)
    }

    /// 解析、校验并分发一个 URI。返回被分发的事件（校验失败时为 `fallback`）。
    pub fn handle_url(&self, url: &str, origin: LinkOrigin) -> Option<DeepLinkEvent> {
        let Some(event) = self.parse(url, origin) else {
            tracing::warn!(
                target: "storefront.deeplink",
                url,
                "unsupported deep link scheme, ignoring"
            );
            return None;
        };
        tracing::debug!(
            target: "storefront.deeplink",
            route = event.route(),
            origin = ?origin,
            "deep link received"
        );

        match validate_event(&event) {
            Ok(()) => {
                self.notify(&event);
                Some(event)
            }
            Err(rejection) => {
                let fallback = self.reject(&event, &rejection);
                Some(fallback)
            }
        }
    }

    /// 校验失败时向所有监听者发送 `fallback` 事件并返回 `false`
    pub fn validate(&self, event: &DeepLinkEvent) -> bool {
        match validate_event(event) {
            Ok(()) => true,
            Err(rejection) => {
                self.reject(event, &rejection);
                false
            }
        }
    }

    fn reject(&self, event: &DeepLinkEvent, rejection: &Rejection) -> DeepLinkEvent {
        tracing::warn!(
            target: "storefront.deeplink",
            route = event.route(),
            reason = rejection.reason.as_str(),
            "deep link rejected, redirecting to fallback"
        );
        let fallback = rejection.fallback_event(event);
        self.notify(&fallback);
        fallback
    }

    /// 注册监听者。若有待处理动作，稍后异步补发（不在注册调用内同步执行）。
    pub fn add_listener<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&DeepLinkEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let (id, has_pending) = {
            let mut state = self.inner.state();
            let id = state.next_listener_id;
            state.next_listener_id += 1;
            state.listeners.push((id, Arc::new(callback)));
            (id, !state.pending.is_empty())
        };

        if has_pending {
            self.schedule_drain();
        }

        ListenerHandle {
            id,
            router: Arc::downgrade(&self.inner),
        }
    }

    fn schedule_drain(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(
                target: "storefront.deeplink",
                "no runtime for scheduled drain, pending actions wait for next foreground"
            );
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.drain_delay;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                DeepLinkRouter { inner }.drain_pending_actions();
            }
        });
    }

    /// 按注册顺序通知当前所有监听者；单个监听者失败不影响其余监听者。
    /// 返回成功处理的监听者数量。
    pub fn notify(&self, event: &DeepLinkEvent) -> usize {
        // 快照：回调中增删监听者不影响本轮遍历
        let listeners: Vec<Listener> = self
            .inner
            .state()
            .listeners
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        let mut delivered = 0;
        for (index, listener) in listeners.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    tracing::error!(
                        target: "storefront.deeplink",
                        listener = index,
                        route = event.route(),
                        error = %e,
                        "deep link listener failed"
                    );
                }
                Err(payload) => {
                    tracing::error!(
                        target: "storefront.deeplink",
                        listener = index,
                        route = event.route(),
                        panic = %panic_message(payload.as_ref()),
                        "deep link listener panicked"
                    );
                }
            }
        }
        delivered
    }

    /// 入队后立即尝试补发；没有监听者时动作保留在队列中
    pub fn trigger_pending_action(&self, kind: impl Into<String>, product_id: impl Into<String>) {
        let action = PendingAction::new(kind, product_id);
        tracing::debug!(
            target: "storefront.deeplink",
            id = %action.id,
            kind = %action.kind,
            "pending action queued"
        );
        self.inner.state().pending.push_back(action);
        self.drain_pending_actions();
    }

    /// 按 FIFO 顺序分发整个队列，每轮先取走当前队列。监听者在某一轮中
    /// 新加入的动作不在该轮处理，而是在下一轮分发。
    ///
    /// A drain started from inside a listener returns 0 and leaves its action
    /// to the outer drain. Returns the number of actions delivered.
    pub fn drain_pending_actions(&self) -> usize {
        {
            let mut state = self.inner.state();
            if state.draining {
                tracing::debug!(
                    target: "storefront.deeplink",
                    queued = state.pending.len(),
                    "drain already in progress, deferring"
                );
                return 0;
            }
            state.draining = true;
        }

        let mut count = 0;
        loop {
            let batch: Vec<PendingAction> = {
                let mut state = self.inner.state();
                if state.listeners.is_empty() || state.pending.is_empty() {
                    state.draining = false;
                    break;
                }
                state.pending.drain(..).collect()
            };

            tracing::debug!(
                target: "storefront.deeplink",
                batch = batch.len(),
                "draining pending actions"
            );
            count += batch.len();
            for action in batch {
                let event = self.pending_event(&action);
                self.notify(&event);
            }
        }
        count
    }

    fn pending_event(&self, action: &PendingAction) -> DeepLinkEvent {
        let route = action.route();
        let product_id = action.payload.product_id.as_str();
        let mut params = BTreeMap::new();
        params.insert("productId".to_string(), product_id.to_string());
        params.insert("action".to_string(), action.kind.clone());
        DeepLinkEvent::new(
            self.inner.parser.link_for(&route, &[product_id]),
            route,
            params,
            LinkOrigin::WarmStart,
        )
    }

    /// 诊断工具：通过平台能力打开 URL。自定义 scheme 无法打开即失败；
    /// https 链接退回到浏览器打开。
    pub async fn test_deep_link(&self, url: &str) -> bool {
        let Some(opener) = self.inner.opener.as_ref() else {
            tracing::warn!(target: "storefront.deeplink", url, "no link opener configured");
            return false;
        };

        let can_open = match opener.can_open(url).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(target: "storefront.deeplink", url, error = %e, "can_open failed");
                false
            }
        };

        if can_open {
            match opener.open(url).await {
                Ok(()) => return true,
                Err(e) => {
                    tracing::warn!(target: "storefront.deeplink", url, error = %e, "open failed");
                }
            }
        }

        if url.starts_with("https://") {
            match opener.open_in_browser(url).await {
                Ok(()) => return true,
                Err(e) => {
                    tracing::warn!(
                        target: "storefront.deeplink",
                        url,
                        error = %e,
                        "browser fallback failed"
                    );
                }
            }
        }
        false
    }

    pub fn get_status(&self) -> RouterStatus {
        let state = self.inner.state();
        RouterStatus {
            initialized: state.phase == RouterPhase::Ready,
            listener_count: state.listeners.len(),
            pending_action_count: state.pending.len(),
            platform: std::env::consts::OS.to_string(),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
