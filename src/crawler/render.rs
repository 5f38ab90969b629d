//! Rendered-DOM fallback
//!
//! One headless browser is launched per crawl and shared by every page that
//! escalates. Each render opens its own tab, navigates, reads the DOM and
//! closes the tab again; the tab is closed on every path.
//!
//! The browser sits behind the [`Renderer`] trait so the crawl can be driven
//! by other implementations (tests use a scripted one).

use crate::config::BrowserConfig;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Errors raised by the rendering backend
#[derive(Debug, Error)]
pub enum RenderError {
    /// The shared browser could not be started; fatal for the crawl
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to open browser tab: {0}")]
    Tab(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Render of {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Failed to read rendered DOM: {0}")]
    Content(String),

    #[error("Failed to close browser resource: {0}")]
    Close(String),
}

/// A source of browser tabs shared across the whole crawl
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Opens a fresh tab
    async fn open_tab(&self) -> Result<Box<dyn RenderTab>, RenderError>;

    /// Shuts the backend down at crawl end
    async fn shutdown(&self) -> Result<(), RenderError>;
}

/// One open browser tab
#[async_trait]
pub trait RenderTab: Send {
    /// Navigates and waits for the page load
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError>;

    /// Serialized DOM of the current document
    async fn content(&mut self) -> Result<String, RenderError>;

    /// Closes the tab, consuming it
    async fn close(self: Box<Self>) -> Result<(), RenderError>;
}

/// Renders a URL in a new tab and returns the resulting HTML
///
/// Navigation and DOM retrieval together are bounded by `timeout`. The tab is
/// closed exactly once whether rendering succeeds, fails or times out; a
/// close failure is logged and does not override the render result.
pub async fn render_html(
    renderer: &dyn Renderer,
    url: &str,
    timeout: Duration,
) -> Result<String, RenderError> {
    let mut tab = renderer.open_tab().await?;

    let result = match tokio::time::timeout(timeout, async {
        tab.navigate(url).await?;
        tab.content().await
    })
    .await
    {
        Ok(result) => result,
        Err(_) => Err(RenderError::Timeout {
            url: url.to_string(),
            timeout,
        }),
    };

    if let Err(e) = tab.close().await {
        tracing::warn!("Failed to close tab for {}: {}", url, e);
    }

    result
}

/// Headless Chromium via the DevTools protocol
pub struct ChromiumRenderer {
    browser: Mutex<Option<Browser>>,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launches the shared browser instance
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Launch`] if no browser can be started.
    pub async fn launch(config: &BrowserConfig) -> Result<Self, RenderError> {
        let mut builder = ChromeConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }
        let chrome_config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        tracing::info!("Launched headless browser");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler,
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open_tab(&self) -> Result<Box<dyn RenderTab>, RenderError> {
        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| RenderError::Tab("browser already shut down".to_string()))?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Tab(e.to_string()))?;
        Ok(Box::new(ChromiumTab { page }))
    }

    async fn shutdown(&self) -> Result<(), RenderError> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };

        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| RenderError::Close(e.to_string()));
        if let Err(e) = browser.wait().await {
            tracing::debug!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();

        tracing::info!("Closed headless browser");
        closed
    }
}

struct ChromiumTab {
    page: Page,
}

#[async_trait]
impl RenderTab for ChromiumTab {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        self.page
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.page
            .content()
            .await
            .map_err(|e| RenderError::Content(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        self.page
            .close()
            .await
            .map_err(|e| RenderError::Close(e.to_string()))
    }
}
