use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use storefront_core::api::{DeepLinkParser, LinkOpener};

use super::ChannelLinkSource;

/// Opens recognised links by re-injecting them into the in-process link
/// source, the way the OS would hand them back to a registered app.
pub struct LoopbackLinkOpener {
    parser: DeepLinkParser,
    links: Arc<ChannelLinkSource>,
    browser_command: Option<String>,
}

impl LoopbackLinkOpener {
    pub fn new(
        parser: DeepLinkParser,
        links: Arc<ChannelLinkSource>,
        browser_command: Option<String>,
    ) -> Self {
        Self {
            parser,
            links,
            browser_command,
        }
    }
}

#[async_trait]
impl LinkOpener for LoopbackLinkOpener {
    async fn can_open(&self, url: &str) -> Result<bool> {
        Ok(self.parser.is_supported(url))
    }

    async fn open(&self, url: &str) -> Result<()> {
        if !self.parser.is_supported(url) {
            bail!("no handler registered for {url}");
        }
        if self.links.push(url) == 0 {
            bail!("no running router is listening for {url}");
        }
        Ok(())
    }

    async fn open_in_browser(&self, url: &str) -> Result<()> {
        let Some(cmd) = self.browser_command.as_deref().filter(|c| !c.trim().is_empty()) else {
            bail!("no browser command configured");
        };
        let status = tokio::process::Command::new(cmd)
            .arg(url)
            .status()
            .await
            .with_context(|| format!("spawn browser `{cmd}`"))?;
        if !status.success() {
            bail!("browser `{cmd}` exited with {status}");
        }
        tracing::info!(url, browser = cmd, "opened in browser");
        Ok(())
    }
}
