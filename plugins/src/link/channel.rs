use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use tokio::sync::broadcast;

use storefront_core::api::{AppLifecycleState, LifecycleSource, LinkSource};

const CHANNEL_CAPACITY: usize = 64;

fn broadcast_stream<T: Clone + Send + 'static>(
    rx: broadcast::Receiver<T>,
) -> BoxStream<'static, T> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(item) => return Some((item, rx)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "link subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .boxed()
}

/// In-process URI source. The launch URI is handed out once.
pub struct ChannelLinkSource {
    initial: Mutex<Option<String>>,
    tx: broadcast::Sender<String>,
}

impl ChannelLinkSource {
    pub fn new(initial_url: Option<String>) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            initial: Mutex::new(initial_url),
            tx,
        }
    }

    /// Deliver a URI to running subscribers. Returns how many received it.
    pub fn push(&self, url: impl Into<String>) -> usize {
        self.tx.send(url.into()).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl LinkSource for ChannelLinkSource {
    async fn initial_url(&self) -> anyhow::Result<Option<String>> {
        let mut initial = self
            .initial
            .lock()
            .map_err(|_| anyhow::anyhow!("initial url lock poisoned"))?;
        Ok(initial.take())
    }

    fn subscribe(&self) -> BoxStream<'static, String> {
        broadcast_stream(self.tx.subscribe())
    }
}

/// In-process foreground/background signal.
pub struct ChannelLifecycle {
    tx: broadcast::Sender<AppLifecycleState>,
}

impl Default for ChannelLifecycle {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl ChannelLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&self, state: AppLifecycleState) {
        let _ = self.tx.send(state);
    }
}

impl LifecycleSource for ChannelLifecycle {
    fn subscribe(&self) -> BoxStream<'static, AppLifecycleState> {
        broadcast_stream(self.tx.subscribe())
    }
}
