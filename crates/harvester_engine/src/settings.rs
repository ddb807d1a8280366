use std::time::Duration;

use harvester_core::SiteProfile;

/// Listing items the site renders per scroll step, used to size the default
/// scroll budget.
const ITEMS_PER_SCROLL: usize = 10;
/// Extra scroll cycles on top of the estimate.
const SCROLL_HEADROOM: usize = 5;

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub listing_url: String,
    pub profile: SiteProfile,
    /// Stop discovering once this many listing items are visible; also caps
    /// the number of records extracted.
    pub max_items: usize,
    /// Upper bound on scroll-and-snapshot cycles.
    pub max_scrolls: usize,
    /// Pause after each scroll so lazily rendered items can load.
    pub settle_interval: Duration,
    /// Bounded wait for a detail page's answer container.
    pub render_timeout: Duration,
    /// Detail contexts allowed open at the same time.
    pub max_contexts: usize,
    /// Deadline measured from the start of the run. Detail fetches still
    /// pending or in flight when it passes degrade; the listing scan ignores it.
    pub run_deadline: Option<Duration>,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        let max_items = 30;
        Self {
            listing_url: "https://www.askiitm.com/resources?tab=resources-quickreads".to_string(),
            profile: SiteProfile::default(),
            max_items,
            max_scrolls: default_max_scrolls(max_items),
            settle_interval: Duration::from_secs(2),
            render_timeout: Duration::from_secs(10),
            max_contexts: 4,
            run_deadline: None,
        }
    }
}

/// Enough cycles to load `max_items` at the site's page size, plus headroom.
pub fn default_max_scrolls(max_items: usize) -> usize {
    max_items.div_ceil(ITEMS_PER_SCROLL) + SCROLL_HEADROOM
}
