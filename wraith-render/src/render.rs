use crate::error::{RenderError, Result};
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;
use wraith_scanner::has_bad_phrase;

/// One headless browser plus the single page it navigates. Each render
/// worker owns exactly one of these; dropping it kills the browser child
/// process, which is what makes supervisor aborts safe.
pub(crate) struct RenderWorker {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl RenderWorker {
    pub(crate) async fn launch(navigation_timeout: Duration) -> Result<Self> {
        let config = BrowserConfig::builder()
            .args(vec![
                "--disable-gpu",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-extensions",
                "--disable-background-networking",
            ])
            .build()
            .map_err(RenderError::BadConfig)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        // The CDP event stream has to be drained for the browser to work.
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });
        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            handler_task,
            navigation_timeout,
        })
    }

    /// Render one URL. `Ok(Some(final_url))` means the page looks live,
    /// `Ok(None)` means it rendered into an error page.
    pub(crate) async fn check(&self, url: &str) -> Result<Option<String>> {
        tokio::time::timeout(self.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| RenderError::NavigationTimeout(self.navigation_timeout))??;

        let final_url = self
            .page
            .url()
            .await?
            .unwrap_or_else(|| url.to_string());

        if final_url != url && bounced_to_root(url, &final_url) {
            debug!("{} rendered straight to the site root", url);
            return Ok(None);
        }

        let html = self.page.content().await?;
        if has_bad_phrase(&html) {
            debug!("{} shows an error phrase after rendering", url);
            return Ok(None);
        }

        Ok(Some(final_url))
    }

    pub(crate) async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

/// True when rendering moved the page from a non-root path to the root.
pub(crate) fn bounced_to_root(requested: &str, rendered: &str) -> bool {
    let (Ok(requested), Ok(rendered)) = (Url::parse(requested), Url::parse(rendered)) else {
        return false;
    };
    rendered.path() == "/" && requested.path() != "/"
}
