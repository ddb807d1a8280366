//! Headless Chromium render session over CDP.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::{ContextHandle, RenderError, RenderFailure, RenderSession};

const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    pub headless: bool,
    /// Chrome/Chromium binary; chromiumoxide's own detection is used when
    /// unset.
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
    pub window_size: (u32, u32),
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            args: Vec::new(),
            window_size: (1920, 1080),
        }
    }
}

/// One browser process; every context is a tab.
pub struct ChromiumSession {
    browser: Mutex<Browser>,
    pages: StdMutex<HashMap<ContextHandle, Page>>,
    next_id: AtomicU64,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Start the browser. Any failure is a launch failure.
    pub async fn launch(options: ChromiumOptions) -> Result<Self, RenderError> {
        engine_info!("Launching browser (headless={})", options.headless);

        let (width, height) = options.window_size;
        let mut builder = BrowserConfig::builder().window_size(width, height);
        if let Some(path) = options.executable.as_ref() {
            builder = builder.chrome_executable(path);
        }
        if !options.headless {
            builder = builder.with_head();
        }
        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        for arg in &options.args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| RenderError::new(RenderFailure::Launch, e))?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::new(RenderFailure::Launch, e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
            pages: StdMutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            handler,
        })
    }

    /// Close every tab and the browser process.
    pub async fn shutdown(self) {
        let pages: Vec<Page> = match self.pages.lock() {
            Ok(mut pages) => pages.drain().map(|(_, page)| page).collect(),
            Err(_) => Vec::new(),
        };
        for page in pages {
            let _ = page.close().await;
        }
        let mut browser = self.browser.lock().await;
        if let Err(err) = browser.close().await {
            engine_warn!("Browser did not close cleanly: {}", err);
        }
    }

    fn page(&self, handle: ContextHandle) -> Result<Page, RenderError> {
        let pages = self
            .pages
            .lock()
            .map_err(|_| RenderError::new(RenderFailure::Launch, "tab table poisoned"))?;
        pages.get(&handle).cloned().ok_or_else(|| {
            RenderError::new(RenderFailure::UnknownContext(handle), "context is not open")
        })
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait::async_trait]
impl RenderSession for ChromiumSession {
    async fn open_context(&self) -> Result<ContextHandle, RenderError> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| RenderError::new(RenderFailure::Launch, e.to_string()))?
        };
        let handle = ContextHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.pages
            .lock()
            .map_err(|_| RenderError::new(RenderFailure::Launch, "tab table poisoned"))?
            .insert(handle, page);
        engine_debug!("Opened {}", handle);
        Ok(handle)
    }

    async fn navigate(&self, handle: ContextHandle, url: &str) -> Result<(), RenderError> {
        let page = self.page(handle)?;
        engine_debug!("{} navigating to {}", handle, url);
        page.goto(url)
            .await
            .map_err(|e| RenderError::new(RenderFailure::Navigation, format!("{url}: {e}")))?;
        Ok(())
    }

    async fn snapshot(&self, handle: ContextHandle) -> Result<String, RenderError> {
        let page = self.page(handle)?;
        page.content()
            .await
            .map_err(|e| RenderError::new(RenderFailure::Navigation, e.to_string()))
    }

    async fn scroll_to_bottom(&self, handle: ContextHandle) -> Result<(), RenderError> {
        let page = self.page(handle)?;
        page.evaluate(SCROLL_TO_BOTTOM_SCRIPT)
            .await
            .map_err(|e| RenderError::new(RenderFailure::Script, e.to_string()))?;
        Ok(())
    }

    async fn close_context(&self, handle: ContextHandle) -> Result<(), RenderError> {
        let page = self
            .pages
            .lock()
            .map_err(|_| RenderError::new(RenderFailure::Launch, "tab table poisoned"))?
            .remove(&handle)
            .ok_or_else(|| {
                RenderError::new(RenderFailure::UnknownContext(handle), "context is not open")
            })?;
        page.close()
            .await
            .map_err(|e| RenderError::new(RenderFailure::Navigation, e.to_string()))?;
        engine_debug!("Closed {}", handle);
        Ok(())
    }

    async fn wait_for_element(
        &self,
        handle: ContextHandle,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, RenderError> {
        let page = self.page(handle)?;
        let poll = async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        Ok(tokio::time::timeout(timeout, poll).await.is_ok())
    }
}
