#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use harvester_engine::{
    ContextHandle, HarvestSettings, RenderError, RenderFailure, RenderSession,
};

pub const ORIGIN: &str = "https://faq.example";
pub const LISTING_URL: &str = "https://faq.example/resources";

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Settings pointing at the scripted site with no settle pause.
pub fn test_settings() -> HarvestSettings {
    let mut settings = HarvestSettings {
        listing_url: LISTING_URL.to_string(),
        settle_interval: Duration::ZERO,
        render_timeout: Duration::from_millis(50),
        max_contexts: 1,
        max_items: 30,
        max_scrolls: 8,
        ..HarvestSettings::default()
    };
    settings.profile.origin = ORIGIN.to_string();
    settings
}

pub fn listing_item(title: Option<&str>, tag: Option<&str>, href: Option<&str>) -> String {
    let title = title
        .map(|t| format!(r#"<h3 class="articel-chip-title">{t}</h3>"#))
        .unwrap_or_default();
    let tag = tag
        .map(|t| format!(r#"<div fs-cmsfilter-field="category">{t}</div>"#))
        .unwrap_or_default();
    let body = format!("{tag}{title}");
    let card = match href {
        Some(href) => format!(r#"<a class="link-block w-inline-block" href="{href}">{body}</a>"#),
        None => body,
    };
    format!(r#"<div role="listitem" class="w-dyn-item">{card}</div>"#)
}

pub fn listing_page(items: &[String]) -> String {
    format!(
        r#"<html><body><div class="w-dyn-list"><div class="w-dyn-items">{}</div></div></body></html>"#,
        items.concat()
    )
}

/// Listing page with `count` linked items numbered from 0.
pub fn numbered_listing(count: usize) -> String {
    let items: Vec<String> = (0..count)
        .map(|i| {
            listing_item(
                Some(&format!("Question {i}?")),
                Some("General"),
                Some(&format!("/faq/{i}")),
            )
        })
        .collect();
    listing_page(&items)
}

pub fn detail_page(answer: &str, related: &[(Option<&str>, Option<&str>)]) -> String {
    let blocks: String = related
        .iter()
        .map(|(title, href)| {
            let title = title
                .map(|t| format!(r#"<h3 class="articel-chip-title">{t}</h3>"#))
                .unwrap_or_default();
            let link = href
                .map(|h| format!(r#"<a class="link-block w-inline-block" href="{h}">read</a>"#))
                .unwrap_or_default();
            format!(r#"<div class="reads-collection-item">{title}{link}</div>"#)
        })
        .collect();
    format!(
        r#"<html><body><div class="rich-text-wrapper w-richtext"><p>{answer}</p></div><div class="reads-collection-list-wrapper">{blocks}</div></body></html>"#
    )
}

#[derive(Debug, Clone)]
pub enum DetailPage {
    /// Navigation takes `delay`, then the answer container is present.
    Rendered { html: String, delay: Duration },
    /// Page loads but the answer container never appears.
    NeverRenders,
    /// Navigation fails.
    Broken,
    /// Navigation panics.
    Panics,
}

impl DetailPage {
    pub fn rendered(html: String) -> Self {
        DetailPage::Rendered {
            html,
            delay: Duration::ZERO,
        }
    }

    pub fn slow(html: String, delay: Duration) -> Self {
        DetailPage::Rendered { html, delay }
    }
}

#[derive(Debug, Default)]
pub struct SessionStats {
    pub scrolls: usize,
    pub opened: usize,
    pub closed: usize,
    pub open_now: usize,
    pub max_open: usize,
    /// Detail URLs in the order their snapshots were taken.
    pub completed: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    contexts: HashMap<ContextHandle, Option<String>>,
    stats: SessionStats,
}

/// In-memory render session driven by a script.
///
/// The listing context shows `listing_steps[k - 1]` after `k` scrolls
/// (clamped to the last step, and the first step before any scroll).
#[derive(Debug, Default)]
pub struct ScriptedSession {
    listing_steps: Vec<String>,
    pages: HashMap<String, DetailPage>,
    open_limit: Option<usize>,
    state: Mutex<State>,
}

impl ScriptedSession {
    pub fn new(listing_steps: Vec<String>) -> Self {
        Self {
            listing_steps,
            ..Self::default()
        }
    }

    pub fn with_page(mut self, url: &str, page: DetailPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Refuse every `open_context` after `limit` successful opens.
    pub fn with_open_limit(mut self, limit: usize) -> Self {
        self.open_limit = Some(limit);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn stats<T>(&self, f: impl FnOnce(&SessionStats) -> T) -> T {
        f(&self.state.lock().unwrap().stats)
    }

    fn current_url(&self, handle: ContextHandle) -> Result<Option<String>, RenderError> {
        self.state
            .lock()
            .unwrap()
            .contexts
            .get(&handle)
            .cloned()
            .ok_or_else(|| RenderError::new(RenderFailure::UnknownContext(handle), "not open"))
    }

    fn listing_snapshot(&self) -> String {
        let scrolls = self.state.lock().unwrap().stats.scrolls;
        let last = self.listing_steps.len().saturating_sub(1);
        self.listing_steps
            .get(scrolls.saturating_sub(1).min(last))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl RenderSession for ScriptedSession {
    async fn open_context(&self) -> Result<ContextHandle, RenderError> {
        let mut state = self.state.lock().unwrap();
        if let Some(limit) = self.open_limit {
            if state.stats.opened >= limit {
                return Err(RenderError::new(RenderFailure::Launch, "browser is gone"));
            }
        }
        state.next_id += 1;
        let handle = ContextHandle(state.next_id);
        state.contexts.insert(handle, None);
        state.stats.opened += 1;
        state.stats.open_now += 1;
        state.stats.max_open = state.stats.max_open.max(state.stats.open_now);
        Ok(handle)
    }

    async fn navigate(&self, handle: ContextHandle, url: &str) -> Result<(), RenderError> {
        self.current_url(handle)?;
        if url != LISTING_URL {
            match self.pages.get(url) {
                Some(DetailPage::Rendered { delay, .. }) if !delay.is_zero() => {
                    tokio::time::sleep(*delay).await;
                }
                Some(DetailPage::Broken) | None => {
                    return Err(RenderError::new(
                        RenderFailure::HttpStatus(404),
                        format!("{url} not found"),
                    ));
                }
                Some(DetailPage::Panics) => panic!("renderer crashed on {url}"),
                _ => {}
            }
        }
        self.state
            .lock()
            .unwrap()
            .contexts
            .insert(handle, Some(url.to_string()));
        Ok(())
    }

    async fn snapshot(&self, handle: ContextHandle) -> Result<String, RenderError> {
        let url = self
            .current_url(handle)?
            .ok_or_else(|| RenderError::new(RenderFailure::Navigation, "blank context"))?;
        if url == LISTING_URL {
            return Ok(self.listing_snapshot());
        }
        self.state.lock().unwrap().stats.completed.push(url.clone());
        match self.pages.get(&url) {
            Some(DetailPage::Rendered { html, .. }) => Ok(html.clone()),
            _ => Ok("<html><body><p>loading</p></body></html>".to_string()),
        }
    }

    async fn scroll_to_bottom(&self, handle: ContextHandle) -> Result<(), RenderError> {
        self.current_url(handle)?;
        self.state.lock().unwrap().stats.scrolls += 1;
        Ok(())
    }

    async fn close_context(&self, handle: ContextHandle) -> Result<(), RenderError> {
        let mut state = self.state.lock().unwrap();
        if state.contexts.remove(&handle).is_none() {
            return Err(RenderError::new(
                RenderFailure::UnknownContext(handle),
                "not open",
            ));
        }
        state.stats.closed += 1;
        state.stats.open_now -= 1;
        Ok(())
    }

    async fn wait_for_element(
        &self,
        handle: ContextHandle,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<bool, RenderError> {
        let url = self.current_url(handle)?.unwrap_or_default();
        Ok(matches!(
            self.pages.get(&url),
            Some(DetailPage::Rendered { .. })
        ))
    }
}
