//! Bounded pool of headless browser sessions
//!
//! One Chromium process is launched lazily on first use and shared by every
//! crawl in the process. The number of tabs open at once is capped by a
//! semaphore; a tab is opened for a single fetch and closed before its permit
//! is released.

use crate::config::BrowserConfig;
use crate::crawler::fetcher::{AttemptError, ReadyCondition};
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OnceCell, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A launched browser and the task driving its CDP connection
struct LaunchedBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Drop for LaunchedBrowser {
    fn drop(&mut self) {
        debug!("Shutting down browser handler task");
        self.handler.abort();
    }
}

/// Shared, bounded access to browser tabs
pub struct BrowserPool {
    config: BrowserConfig,
    user_agent: String,
    navigation_timeout: Duration,
    permits: Arc<Semaphore>,
    browser: OnceCell<LaunchedBrowser>,
}

impl BrowserPool {
    pub fn new(config: BrowserConfig, user_agent: String, navigation_timeout: Duration) -> Self {
        let permits = Arc::new(Semaphore::new(config.pool_size.max(1) as usize));
        Self {
            config,
            user_agent,
            navigation_timeout,
            permits,
            browser: OnceCell::new(),
        }
    }

    /// Number of sessions that can be acquired right now
    pub fn available_sessions(&self) -> usize {
        self.permits.available_permits()
    }

    async fn browser(&self) -> Result<&Browser, AttemptError> {
        let launched = self
            .browser
            .get_or_try_init(|| async {
                let mut builder = ChromeConfig::builder()
                    .no_sandbox()
                    .request_timeout(self.navigation_timeout)
                    .arg("--disable-gpu")
                    .arg("--disable-dev-shm-usage");
                if !self.config.headless {
                    builder = builder.with_head();
                }
                let chrome_config = builder.build().map_err(AttemptError::Browser)?;

                info!(headless = self.config.headless, "Launching browser");
                let (browser, mut handler) = Browser::launch(chrome_config)
                    .await
                    .map_err(|e| AttemptError::Browser(e.to_string()))?;

                let handler = tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if event.is_err() {
                            break;
                        }
                    }
                });

                Ok::<_, AttemptError>(LaunchedBrowser { browser, handler })
            })
            .await?;
        Ok(&launched.browser)
    }

    /// Renders `url` in a fresh tab and returns the resulting HTML
    ///
    /// When `ready` is given, the page is polled for the selector for at most
    /// the configured ready timeout; running out of time is a
    /// [`AttemptError::RenderTimeout`].
    pub async fn render(
        &self,
        url: &str,
        ready: Option<&ReadyCondition>,
    ) -> Result<String, AttemptError> {
        trace!(url, available = self.available_sessions(), "Waiting for browser session");
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AttemptError::Browser(e.to_string()))?;

        let browser = self.browser().await?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AttemptError::Browser(e.to_string()))?;

        let result = self.load(&page, url, ready).await;

        if let Err(e) = page.close().await {
            warn!(url, error = %e, "Failed to close browser tab");
        }

        result
    }

    async fn load(
        &self,
        page: &Page,
        url: &str,
        ready: Option<&ReadyCondition>,
    ) -> Result<String, AttemptError> {
        page.set_user_agent(self.user_agent.as_str())
            .await
            .map_err(|e| AttemptError::Browser(e.to_string()))?;

        tokio::time::timeout(self.navigation_timeout, page.goto(url))
            .await
            .map_err(|_| AttemptError::Timeout)?
            .map_err(|e| AttemptError::Browser(e.to_string()))?;

        if let Some(condition) = ready {
            let budget = Duration::from_secs(self.config.ready_timeout);
            tokio::time::timeout(budget, wait_for_selector(page, condition.as_str()))
                .await
                .map_err(|_| AttemptError::RenderTimeout {
                    selector: condition.as_str().to_string(),
                })?;
        }

        page.content()
            .await
            .map_err(|e| AttemptError::Browser(e.to_string()))
    }
}

async fn wait_for_selector(page: &Page, selector: &str) {
    loop {
        if page.find_element(selector).await.is_ok() {
            return;
        }
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
}

impl std::fmt::Debug for BrowserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserPool")
            .field("pool_size", &self.config.pool_size)
            .field("available", &self.permits.available_permits())
            .field("launched", &self.browser.initialized())
            .finish()
    }
}
