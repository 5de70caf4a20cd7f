#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value as JsonValue;

use storefront_core::api::{
    AppLifecycleState, Credentials, KeyValueStore, KvStoreError, LifecycleSource, LinkOpener,
    LinkSource, SecureStore, SecureStoreError,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("storefront=debug"))
        .with_test_writer()
        .try_init();
}

/// Shared start/end log used to check that reads overlap.
#[derive(Clone, Default)]
pub struct Probe {
    log: Arc<Mutex<Vec<String>>>,
}

impl Probe {
    pub fn record(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> usize {
        self.entries()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("missing probe entry {entry}"))
    }
}

const OP_DELAY: Duration = Duration::from_millis(10);

#[derive(Default)]
pub struct FakeSecureStore {
    items: Mutex<HashMap<String, Credentials>>,
    fail_with: Mutex<Option<SecureStoreError>>,
    probe: Option<Probe>,
}

impl FakeSecureStore {
    pub fn with_probe(probe: Probe) -> Self {
        Self {
            probe: Some(probe),
            ..Default::default()
        }
    }

    pub fn insert(&self, service: &str, username: &str, secret: &str) {
        self.items
            .lock()
            .unwrap()
            .insert(service.to_string(), Credentials::new(username, secret));
    }

    pub fn fail_with(&self, err: SecureStoreError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }

    pub fn get_now(&self, service: &str) -> Option<Credentials> {
        self.items.lock().unwrap().get(service).cloned()
    }

    fn check(&self) -> Result<(), SecureStoreError> {
        match self.fail_with.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SecureStore for FakeSecureStore {
    fn name(&self) -> &str {
        "fake-secure"
    }

    async fn save_credentials(
        &self,
        service: &str,
        username: &str,
        secret: &str,
    ) -> Result<bool, SecureStoreError> {
        self.check()?;
        self.insert(service, username, secret);
        Ok(true)
    }

    async fn get_credentials(
        &self,
        service: &str,
    ) -> Result<Option<Credentials>, SecureStoreError> {
        if let Some(p) = &self.probe {
            p.record("start:secure");
        }
        tokio::time::sleep(OP_DELAY).await;
        if let Some(p) = &self.probe {
            p.record("end:secure");
        }
        self.check()?;
        Ok(self.get_now(service))
    }

    async fn reset_credentials(&self, service: &str) -> Result<bool, SecureStoreError> {
        self.check()?;
        Ok(self.items.lock().unwrap().remove(service).is_some())
    }
}

#[derive(Default)]
pub struct FakeKvStore {
    items: Mutex<HashMap<String, JsonValue>>,
    failing_keys: Mutex<HashSet<String>>,
    quota_bytes: Option<usize>,
    probe: Option<Probe>,
}

impl FakeKvStore {
    pub fn with_probe(probe: Probe) -> Self {
        Self {
            probe: Some(probe),
            ..Default::default()
        }
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Default::default()
        }
    }

    pub fn insert(&self, key: &str, value: JsonValue) {
        self.items.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn fail_key(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn value(&self, key: &str) -> Option<JsonValue> {
        self.items.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for FakeKvStore {
    fn name(&self) -> &str {
        "fake-kv"
    }

    async fn get(&self, key: &str) -> Result<Option<JsonValue>, KvStoreError> {
        if let Some(p) = &self.probe {
            p.record(format!("start:{key}"));
        }
        tokio::time::sleep(OP_DELAY).await;
        if let Some(p) = &self.probe {
            p.record(format!("end:{key}"));
        }
        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(KvStoreError::Backend(format!("read of {key} failed")));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: JsonValue) -> Result<(), KvStoreError> {
        let needed = serde_json::to_vec(&value)?.len();
        if let Some(limit) = self.quota_bytes {
            if needed > limit {
                return Err(KvStoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }
        self.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KvStoreError> {
        self.items.lock().unwrap().remove(key);
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, KvStoreError> {
        Ok(self.items.lock().unwrap().keys().cloned().collect())
    }
}

#[derive(Default)]
pub struct FakeLinkSource {
    initial: Mutex<Option<String>>,
    senders: Mutex<Vec<mpsc::UnboundedSender<String>>>,
    pub subscribe_calls: AtomicUsize,
    pub initial_calls: AtomicUsize,
}

impl FakeLinkSource {
    pub fn with_initial(url: &str) -> Self {
        let source = Self::default();
        *source.initial.lock().unwrap() = Some(url.to_string());
        source
    }

    pub fn push(&self, url: &str) {
        self.senders
            .lock()
            .unwrap()
            .retain(|tx| tx.unbounded_send(url.to_string()).is_ok());
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn initial_calls(&self) -> usize {
        self.initial_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkSource for FakeLinkSource {
    async fn initial_url(&self) -> anyhow::Result<Option<String>> {
        self.initial_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.initial.lock().unwrap().clone())
    }

    fn subscribe(&self) -> BoxStream<'static, String> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded();
        self.senders.lock().unwrap().push(tx);
        rx.boxed()
    }
}

#[derive(Default)]
pub struct FakeLifecycle {
    senders: Mutex<Vec<mpsc::UnboundedSender<AppLifecycleState>>>,
}

impl FakeLifecycle {
    pub fn emit(&self, state: AppLifecycleState) {
        self.senders
            .lock()
            .unwrap()
            .retain(|tx| tx.unbounded_send(state).is_ok());
    }
}

impl LifecycleSource for FakeLifecycle {
    fn subscribe(&self) -> BoxStream<'static, AppLifecycleState> {
        let (tx, rx) = mpsc::unbounded();
        self.senders.lock().unwrap().push(tx);
        rx.boxed()
    }
}

pub struct FakeOpener {
    pub can_open: bool,
    pub browser_ok: bool,
    pub opened: Mutex<Vec<String>>,
    pub browsed: Mutex<Vec<String>>,
}

impl FakeOpener {
    pub fn new(can_open: bool, browser_ok: bool) -> Self {
        Self {
            can_open,
            browser_ok,
            opened: Mutex::new(Vec::new()),
            browsed: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LinkOpener for FakeOpener {
    async fn can_open(&self, _url: &str) -> anyhow::Result<bool> {
        Ok(self.can_open)
    }

    async fn open(&self, url: &str) -> anyhow::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn open_in_browser(&self, url: &str) -> anyhow::Result<()> {
        if !self.browser_ok {
            anyhow::bail!("no browser");
        }
        self.browsed.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
