use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};

use crate::decode::decode_page;
use crate::{ContextHandle, RenderError, RenderFailure, RenderSession};

#[derive(Debug, Clone)]
pub struct HttpSessionSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
}

impl Default for HttpSessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: concat!("faq-harvester/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Render session over plain HTTP: every context holds the last page it
/// fetched. No script runs, so scrolling never loads more items and waits
/// resolve against the static document immediately.
pub struct HttpRenderSession {
    settings: HttpSessionSettings,
    client: reqwest::Client,
    next_id: AtomicU64,
    pages: Mutex<HashMap<ContextHandle, Option<String>>>,
}

impl HttpRenderSession {
    pub fn new(settings: HttpSessionSettings) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| RenderError::new(RenderFailure::Launch, err.to_string()))?;
        Ok(Self {
            settings,
            client,
            next_id: AtomicU64::new(1),
            pages: Mutex::new(HashMap::new()),
        })
    }

    fn with_pages<T>(
        &self,
        f: impl FnOnce(&mut HashMap<ContextHandle, Option<String>>) -> T,
    ) -> Result<T, RenderError> {
        let mut pages = self
            .pages
            .lock()
            .map_err(|_| RenderError::new(RenderFailure::Launch, "context table poisoned"))?;
        Ok(f(&mut pages))
    }

    fn ensure_open(&self, handle: ContextHandle) -> Result<(), RenderError> {
        if self.with_pages(|pages| pages.contains_key(&handle))? {
            Ok(())
        } else {
            Err(RenderError::new(
                RenderFailure::UnknownContext(handle),
                "context is not open",
            ))
        }
    }

    fn current_page(&self, handle: ContextHandle) -> Result<Option<String>, RenderError> {
        self.with_pages(|pages| pages.get(&handle).cloned())?
            .ok_or_else(|| RenderError::new(RenderFailure::UnknownContext(handle), "context is not open"))
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    async fn download(&self, url: &str) -> Result<String, RenderError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| RenderError::new(RenderFailure::InvalidUrl, err.to_string()))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::new(
                RenderFailure::HttpStatus(status.as_u16()),
                format!("{url} answered {status}"),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(RenderError::new(
                    RenderFailure::Navigation,
                    format!("unsupported content type {ct}"),
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if bytes.len() as u64 + chunk.len() as u64 > self.settings.max_bytes {
                return Err(RenderError::new(
                    RenderFailure::Navigation,
                    format!("page exceeds {} bytes", self.settings.max_bytes),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        decode_page(&bytes, content_type.as_deref())
    }
}

#[async_trait::async_trait]
impl RenderSession for HttpRenderSession {
    async fn open_context(&self) -> Result<ContextHandle, RenderError> {
        let handle = ContextHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.with_pages(|pages| pages.insert(handle, None))?;
        Ok(handle)
    }

    async fn navigate(&self, handle: ContextHandle, url: &str) -> Result<(), RenderError> {
        self.ensure_open(handle)?;
        let html = self.download(url).await?;
        // The context may have been closed while the request was in flight.
        self.with_pages(|pages| {
            if let Some(slot) = pages.get_mut(&handle) {
                *slot = Some(html);
            }
        })
    }

    async fn snapshot(&self, handle: ContextHandle) -> Result<String, RenderError> {
        self.current_page(handle)?.ok_or_else(|| {
            RenderError::new(RenderFailure::Navigation, format!("{handle} has not navigated"))
        })
    }

    async fn scroll_to_bottom(&self, handle: ContextHandle) -> Result<(), RenderError> {
        self.ensure_open(handle)
    }

    async fn close_context(&self, handle: ContextHandle) -> Result<(), RenderError> {
        match self.with_pages(|pages| pages.remove(&handle))? {
            Some(_) => Ok(()),
            None => Err(RenderError::new(
                RenderFailure::UnknownContext(handle),
                "context is not open",
            )),
        }
    }

    async fn wait_for_element(
        &self,
        handle: ContextHandle,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, RenderError> {
        match self.current_page(handle)? {
            Some(html) => document_matches(&html, selector),
            None => Ok(false),
        }
    }
}

fn document_matches(html: &str, selector: &str) -> Result<bool, RenderError> {
    let selector = Selector::parse(selector)
        .map_err(|err| RenderError::new(RenderFailure::Script, format!("{selector}: {err:?}")))?;
    let document = Html::parse_document(html);
    let found = document.select(&selector).next().is_some();
    Ok(found)
}

fn map_reqwest_error(err: reqwest::Error) -> RenderError {
    if err.is_timeout() {
        return RenderError::new(RenderFailure::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return RenderError::new(RenderFailure::Navigation, err.to_string());
    }
    RenderError::new(RenderFailure::Network, err.to_string())
}
